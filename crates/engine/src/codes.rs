//! Payment codes.
//!
//! A [`Code`] binds a short token to a set of budgets and the percentage each
//! of them receives from a payment carrying that token. The pairing is stored
//! canonically (sorted by budget id) so the same split always maps to the same
//! token, whatever order the caller listed the budgets in.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine, allocator::MAX_PERCENT};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub id: i64,
    pub token: String,
    /// Recipient budgets, sorted by id.
    pub budget_ids: Vec<i64>,
    /// Percentage per budget, positionally paired with `budget_ids`.
    pub ratios: Vec<i64>,
    pub user_id: Option<i64>,
}

impl Code {
    /// Iterate `(budget_id, ratio)` pairs.
    pub fn splits(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.budget_ids
            .iter()
            .copied()
            .zip(self.ratios.iter().copied())
    }
}

/// Validate a budget/ratio set and return it sorted by budget id.
///
/// - lists of different length (or repeated budgets) are an
///   [`EngineError::InvalidBudgetRatioSet`]
/// - ratios outside `0..=100` or not adding up to exactly 100 are an
///   [`EngineError::InvalidRatio`]
pub fn canonicalize(budget_ids: &[i64], ratios: &[i64]) -> ResultEngine<(Vec<i64>, Vec<i64>)> {
    if budget_ids.len() != ratios.len() {
        return Err(EngineError::InvalidBudgetRatioSet(format!(
            "{} budgets but {} ratios",
            budget_ids.len(),
            ratios.len()
        )));
    }
    if let Some(id) = budget_ids.iter().find(|id| **id < 1) {
        return Err(EngineError::InvalidId(format!("invalid budget id {id}")));
    }
    if let Some(ratio) = ratios.iter().find(|r| !(0..=MAX_PERCENT).contains(*r)) {
        return Err(EngineError::InvalidRatio(format!(
            "ratio {ratio} is outside 0..=100"
        )));
    }
    let total: i64 = ratios.iter().sum();
    if total != MAX_PERCENT {
        return Err(EngineError::InvalidRatio(format!(
            "ratios add up to {total}, expected 100"
        )));
    }

    let mut pairs: Vec<(i64, i64)> = budget_ids
        .iter()
        .copied()
        .zip(ratios.iter().copied())
        .collect();
    pairs.sort_by_key(|(budget_id, _)| *budget_id);
    if pairs.windows(2).any(|pair| pair[0].0 == pair[1].0) {
        return Err(EngineError::InvalidBudgetRatioSet(
            "a budget is listed more than once".to_string(),
        ));
    }

    Ok(pairs.into_iter().unzip())
}

/// Parse ratios typed as text (e.g. query parameters).
pub fn parse_ratios<S: AsRef<str>>(raw: &[S]) -> ResultEngine<Vec<i64>> {
    raw.iter()
        .map(|value| {
            let value = value.as_ref().trim();
            value
                .parse::<i64>()
                .map_err(|_| EngineError::InvalidRatio(format!("{value:?} is not a number")))
        })
        .collect()
}

pub(crate) fn encode_ids(values: &[i64]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_ids(value: &str, label: &str) -> ResultEngine<Vec<i64>> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| EngineError::InvalidId(format!("invalid stored {label}: {part}")))
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "codes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub token: String,
    /// Comma separated, ascending.
    pub budget_ids: String,
    /// Comma separated, paired with `budget_ids`.
    pub ratios: String,
    pub user_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Code> for ActiveModel {
    fn from(code: &Code) -> Self {
        Self {
            id: ActiveValue::NotSet,
            token: ActiveValue::Set(code.token.clone()),
            budget_ids: ActiveValue::Set(encode_ids(&code.budget_ids)),
            ratios: ActiveValue::Set(encode_ids(&code.ratios)),
            user_id: ActiveValue::Set(code.user_id),
        }
    }
}

impl TryFrom<Model> for Code {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let budget_ids = decode_ids(&model.budget_ids, "budget id")?;
        let ratios = decode_ids(&model.ratios, "ratio")?;
        if budget_ids.len() != ratios.len() {
            return Err(EngineError::InvalidBudgetRatioSet(format!(
                "stored code {} is inconsistent",
                model.token
            )));
        }
        Ok(Self {
            id: model.id,
            token: model.token,
            budget_ids,
            ratios,
            user_id: model.user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_pairs_by_budget() {
        let (budgets, ratios) = canonicalize(&[9, 3, 5], &[20, 50, 30]).unwrap();
        assert_eq!(budgets, vec![3, 5, 9]);
        assert_eq!(ratios, vec![50, 30, 20]);
    }

    #[test]
    fn rejects_length_mismatch() {
        assert!(matches!(
            canonicalize(&[1, 2], &[50, 25, 25]),
            Err(EngineError::InvalidBudgetRatioSet(_))
        ));
    }

    #[test]
    fn rejects_bad_ratio_sums() {
        assert!(matches!(
            canonicalize(&[1, 2, 3], &[50, 50, 1]),
            Err(EngineError::InvalidRatio(_))
        ));
        assert!(matches!(
            canonicalize(&[], &[]),
            Err(EngineError::InvalidRatio(_))
        ));
        assert!(matches!(
            canonicalize(&[1, 2], &[120, -20]),
            Err(EngineError::InvalidRatio(_))
        ));
    }

    #[test]
    fn rejects_repeated_budget() {
        assert!(matches!(
            canonicalize(&[4, 4], &[50, 50]),
            Err(EngineError::InvalidBudgetRatioSet(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_ratio() {
        assert!(matches!(
            parse_ratios(&["60", "4o"]),
            Err(EngineError::InvalidRatio(_))
        ));
        assert_eq!(parse_ratios(&[" 60", "40 "]).unwrap(), vec![60, 40]);
    }

    #[test]
    fn stored_lists_round_trip() {
        let model = Model {
            id: 1,
            token: "KM3SAT9W".to_string(),
            budget_ids: encode_ids(&[2, 7]),
            ratios: encode_ids(&[60, 40]),
            user_id: None,
        };
        let code = Code::try_from(model).unwrap();
        assert_eq!(code.splits().collect::<Vec<_>>(), vec![(2, 60), (7, 40)]);
    }
}
