use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    Create,
    Edit,
    View,
}

/// Detail-form state derived purely from the selected entity and the mode,
/// decoupled from list state. Callers report the result through explicit
/// outcome values rather than shared mutable references.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormState<T> {
    pub mode: FormMode,
    pub value: Option<T>,
}

impl<T: Clone> FormState<T> {
    pub fn derive(selected: Option<&T>, mode: FormMode) -> Self {
        let value = match mode {
            FormMode::Create => None,
            FormMode::Edit | FormMode::View => selected.cloned(),
        };
        Self { mode, value }
    }

    pub fn editable(&self) -> bool {
        matches!(self.mode, FormMode::Create | FormMode::Edit)
    }

    /// Edit and view require an existing entity; a form derived without one
    /// is incomplete and must not be submitted.
    pub fn is_ready(&self) -> bool {
        match self.mode {
            FormMode::Create => true,
            FormMode::Edit | FormMode::View => self.value.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FormMode, FormState};

    #[test]
    fn create_mode_ignores_selection() {
        let state = FormState::derive(Some(&"existing"), FormMode::Create);
        assert!(state.value.is_none());
        assert!(state.editable());
        assert!(state.is_ready());
    }

    #[test]
    fn edit_without_selection_is_not_ready() {
        let state: FormState<&str> = FormState::derive(None, FormMode::Edit);
        assert!(!state.is_ready());

        let state = FormState::derive(Some(&"row"), FormMode::View);
        assert!(state.is_ready());
        assert!(!state.editable());
    }
}
