use crate::{
    Distance, DistanceError, Field, FieldSet, NewSet, Reps, RepsError, Seconds, SecondsError,
    SetType, Weight, WeightError,
};

/// Text entered for the next set of a workout exercise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetInput {
    pub reps: String,
    pub weight: String,
    pub duration: String,
    pub distance: String,
    pub rest_time: String,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SetInputError {
    #[error(transparent)]
    Reps(#[from] RepsError),
    #[error(transparent)]
    Weight(#[from] WeightError),
    #[error("Duration: {0}")]
    Duration(SecondsError),
    #[error(transparent)]
    Distance(#[from] DistanceError),
    #[error("Rest time: {0}")]
    RestTime(SecondsError),
}

impl SetInput {
    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Reps => &self.reps,
            Field::Weight => &self.weight,
            Field::Duration => &self.duration,
            Field::Distance => &self.distance,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Reps => self.reps = value,
            Field::Weight => self.weight = value,
            Field::Duration => self.duration = value,
            Field::Distance => self.distance = value,
        }
    }

    /// Build the request for a new set.
    ///
    /// Empty inputs and inputs of fields outside `fields` are left out. Rest time is independent
    /// of the field set.
    pub fn to_new_set(&self, fields: &FieldSet, set_number: u32) -> Result<NewSet, SetInputError> {
        let input = |field: Field| {
            let value = self.get(field).trim();
            if fields.contains(field) && !value.is_empty() {
                Some(value)
            } else {
                None
            }
        };

        Ok(NewSet {
            set_number,
            set_type: SetType::Normal,
            reps: input(Field::Reps).map(Reps::try_from).transpose()?,
            weight: input(Field::Weight).map(Weight::try_from).transpose()?,
            duration: input(Field::Duration)
                .map(Seconds::try_from)
                .transpose()
                .map_err(SetInputError::Duration)?,
            distance: input(Field::Distance)
                .map(Distance::try_from)
                .transpose()?,
            rest_time: Some(self.rest_time.trim())
                .filter(|v| !v.is_empty())
                .map(Seconds::try_from)
                .transpose()
                .map_err(SetInputError::RestTime)?,
        })
    }
}
