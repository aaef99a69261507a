use derive_more::{Display, Into};

#[derive(Debug, Default, Display, Clone, Copy, Into, PartialEq, Eq, PartialOrd, Ord)]
pub struct Reps(u32);

impl Reps {
    #[must_use]
    pub fn new(value: u32) -> Self {
        Self(value)
    }
}

impl TryFrom<&str> for Reps {
    type Error = RepsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().parse::<u32>() {
            Ok(parsed_value) => Ok(Reps::new(parsed_value)),
            Err(_) => Err(RepsError::ParseError),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RepsError {
    #[error("Reps must be a non-negative integer")]
    ParseError,
}

#[derive(Debug, Default, Display, Clone, Copy, Into, PartialEq, PartialOrd)]
pub struct Weight(f32);

impl Weight {
    pub fn new(value: f32) -> Result<Self, WeightError> {
        if !value.is_finite() || value < 0.0 {
            return Err(WeightError::OutOfRange);
        }

        Ok(Self(value))
    }
}

impl TryFrom<&str> for Weight {
    type Error = WeightError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().parse::<f32>() {
            Ok(parsed_value) => Weight::new(parsed_value),
            Err(_) => Err(WeightError::ParseError),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum WeightError {
    #[error("Weight must not be negative")]
    OutOfRange,
    #[error("Weight must be a decimal")]
    ParseError,
}

/// Duration in whole seconds.
#[derive(Debug, Default, Display, Clone, Copy, Into, PartialEq, Eq, PartialOrd, Ord)]
pub struct Seconds(u32);

impl Seconds {
    #[must_use]
    pub fn new(value: u32) -> Self {
        Self(value)
    }
}

impl TryFrom<&str> for Seconds {
    type Error = SecondsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().parse::<u32>() {
            Ok(parsed_value) => Ok(Seconds::new(parsed_value)),
            Err(_) => Err(SecondsError::ParseError),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SecondsError {
    #[error("Time must be a non-negative integer")]
    ParseError,
}

/// Distance in meters.
#[derive(Debug, Default, Display, Clone, Copy, Into, PartialEq, PartialOrd)]
pub struct Distance(f32);

impl Distance {
    pub fn new(value: f32) -> Result<Self, DistanceError> {
        if !value.is_finite() || value < 0.0 {
            return Err(DistanceError::OutOfRange);
        }

        Ok(Self(value))
    }
}

impl TryFrom<&str> for Distance {
    type Error = DistanceError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().parse::<f32>() {
            Ok(parsed_value) => Distance::new(parsed_value),
            Err(_) => Err(DistanceError::ParseError),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DistanceError {
    #[error("Distance must not be negative")]
    OutOfRange,
    #[error("Distance must be a decimal")]
    ParseError,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("0", Ok(Reps(0)))]
    #[case("12", Ok(Reps(12)))]
    #[case(" 8 ", Ok(Reps(8)))]
    #[case("-1", Err(RepsError::ParseError))]
    #[case("4.", Err(RepsError::ParseError))]
    #[case("", Err(RepsError::ParseError))]
    fn test_reps_from_str(#[case] input: &str, #[case] expected: Result<Reps, RepsError>) {
        assert_eq!(Reps::try_from(input), expected);
    }

    #[rstest]
    #[case(0.0, Ok(Weight(0.0)))]
    #[case(1.25, Ok(Weight(1.25)))]
    #[case(-0.5, Err(WeightError::OutOfRange))]
    #[case(f32::NAN, Err(WeightError::OutOfRange))]
    #[case(f32::INFINITY, Err(WeightError::OutOfRange))]
    fn test_weight_new(#[case] input: f32, #[case] expected: Result<Weight, WeightError>) {
        assert_eq!(Weight::new(input), expected);
    }

    #[rstest]
    #[case("2.5", Ok(Weight(2.5)))]
    #[case("4.", Ok(Weight(4.0)))]
    #[case("80", Ok(Weight(80.0)))]
    #[case("-5", Err(WeightError::OutOfRange))]
    #[case("heavy", Err(WeightError::ParseError))]
    #[case("", Err(WeightError::ParseError))]
    fn test_weight_from_str(#[case] input: &str, #[case] expected: Result<Weight, WeightError>) {
        assert_eq!(Weight::try_from(input), expected);
    }

    #[rstest]
    #[case(Weight(2.0), "2")]
    #[case(Weight(8.5), "8.5")]
    fn test_weight_display(#[case] input: Weight, #[case] expected: &str) {
        assert_eq!(input.to_string(), expected);
    }

    #[rstest]
    #[case("0", Ok(Seconds(0)))]
    #[case("90", Ok(Seconds(90)))]
    #[case("1.5", Err(SecondsError::ParseError))]
    #[case("", Err(SecondsError::ParseError))]
    fn test_seconds_from_str(#[case] input: &str, #[case] expected: Result<Seconds, SecondsError>) {
        assert_eq!(Seconds::try_from(input), expected);
    }

    #[rstest]
    #[case("5000", Ok(Distance(5000.0)))]
    #[case("0.4", Ok(Distance(0.4)))]
    #[case("-1", Err(DistanceError::OutOfRange))]
    #[case("far", Err(DistanceError::ParseError))]
    fn test_distance_from_str(
        #[case] input: &str,
        #[case] expected: Result<Distance, DistanceError>,
    ) {
        assert_eq!(Distance::try_from(input), expected);
    }
}
