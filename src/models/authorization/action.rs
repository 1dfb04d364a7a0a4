//! Action enum for authorization
use std::fmt;

// Numeric codes follow the call-site convention used in stored
// permission documents: 0=create, 1=read, 2=update, 3=delete.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn code(&self) -> i32 {
        match *self {
            Action::Create => 0,
            Action::Read => 1,
            Action::Update => 2,
            Action::Delete => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Action> {
        match code {
            0 => Some(Action::Create),
            1 => Some(Action::Read),
            2 => Some(Action::Update),
            3 => Some(Action::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Action::Create => write!(f, "create"),
            Action::Read => write!(f, "read"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_codes_roundtrip() {
        for action in [Action::Create, Action::Read, Action::Update, Action::Delete].iter() {
            assert_eq!(Action::from_code(action.code()), Some(*action));
        }
        assert_eq!(Action::from_code(4), None);
    }
}
