use serde::Serialize;
use std::sync::{PoisonError, RwLock};

pub const PLACEHOLDER_TEXT: &str = "Select a train";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DropdownOption {
    pub value: String,
    pub text: String,
}

/// Selection list of current train numbers, rebuilt after every poll.
#[derive(Debug, Default)]
pub struct TrainDropdown {
    train_numbers: RwLock<Vec<u32>>,
}

impl TrainDropdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild<I>(&self, train_numbers: I)
    where
        I: IntoIterator<Item = u32>,
    {
        let mut sorted: Vec<u32> = train_numbers.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();
        *self
            .train_numbers
            .write()
            .unwrap_or_else(PoisonError::into_inner) = sorted;
    }

    pub fn train_numbers(&self) -> Vec<u32> {
        self.train_numbers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Placeholder first, then one option per train in ascending order.
    pub fn options(&self) -> Vec<DropdownOption> {
        let numbers = self.train_numbers();
        let mut options = Vec::with_capacity(numbers.len() + 1);
        options.push(DropdownOption {
            value: String::new(),
            text: PLACEHOLDER_TEXT.to_string(),
        });
        options.extend(numbers.into_iter().map(|n| DropdownOption {
            value: n.to_string(),
            text: n.to_string(),
        }));
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_sorted_numerically() {
        let dropdown = TrainDropdown::new();
        dropdown.rebuild([42, 7, 100]);

        let options = dropdown.options();
        assert_eq!(options[0].value, "");
        assert_eq!(options[0].text, "Select a train");

        let values: Vec<&str> = options[1..].iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["7", "42", "100"]);
    }

    #[test]
    fn test_rebuild_replaces_previous_list() {
        let dropdown = TrainDropdown::new();
        dropdown.rebuild([1, 2, 3]);
        dropdown.rebuild([3, 4]);
        assert_eq!(dropdown.train_numbers(), vec![3, 4]);
    }

    #[test]
    fn test_empty_dropdown_has_only_placeholder() {
        let dropdown = TrainDropdown::new();
        assert_eq!(dropdown.options().len(), 1);
    }
}
