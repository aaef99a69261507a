use strum::{EnumIter, IntoEnumIterator};

/// Protein intake per kilogram of body weight.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum ProteinFactor {
    #[default]
    Moderate,
    Elevated,
    High,
    Maximum,
}

impl ProteinFactor {
    #[must_use]
    pub fn grams_per_kg(self) -> f64 {
        match self {
            ProteinFactor::Moderate => 1.6,
            ProteinFactor::Elevated => 1.8,
            ProteinFactor::High => 2.0,
            ProteinFactor::Maximum => 2.2,
        }
    }

    #[must_use]
    pub fn all() -> Vec<ProteinFactor> {
        ProteinFactor::iter().collect()
    }
}

/// Estimated one-repetition maximum according to the Epley formula.
///
/// Returns 0 if the weight or the number of repetitions is missing or not positive.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn one_rep_max(weight: Option<f64>, reps: Option<f64>) -> u32 {
    match (positive(weight), positive(reps)) {
        (Some(weight), Some(reps)) => (weight * (1.0 + reps / 30.0)).round() as u32,
        _ => 0,
    }
}

/// Daily protein target in grams.
///
/// Returns 0 if the body weight is missing or not positive.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn protein_target(body_weight: Option<f64>, factor: ProteinFactor) -> u32 {
    match positive(body_weight) {
        Some(body_weight) => (body_weight * factor.grams_per_kg()).round() as u32,
        None => 0,
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Raw inputs of the calculators as entered by the user.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Calculator {
    pub weight: String,
    pub reps: String,
    pub body_weight: String,
    pub protein_factor: ProteinFactor,
}

impl Calculator {
    #[must_use]
    pub fn one_rep_max(&self) -> u32 {
        one_rep_max(parse(&self.weight), parse(&self.reps))
    }

    #[must_use]
    pub fn protein_target(&self) -> u32 {
        protein_target(parse(&self.body_weight), self.protein_factor)
    }
}

fn parse(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}
