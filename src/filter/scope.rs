/// Action selection for filters that only guard some actions.
///
/// Built from filter arguments: plain names restrict the filter to those actions, names
/// prefixed with `!` exclude them. With no arguments the filter applies everywhere.
///
/// ```rust,ignore
/// let scope = ActionScope::from_args(&["edit".into(), "delete".into()]);
/// assert!(scope.applies_to("edit"));
/// assert!(!scope.applies_to("index"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionScope {
    only: Vec<String>,
    except: Vec<String>,
}

impl ActionScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_args(args: &[String]) -> Self {
        let mut scope = Self::default();
        for arg in args {
            match arg.strip_prefix('!') {
                Some(excluded) => scope.except.push(excluded.to_owned()),
                None => scope.only.push(arg.clone()),
            }
        }
        scope
    }

    pub fn applies_to(&self, action: &str) -> bool {
        if self.except.iter().any(|a| a == action) {
            return false;
        }
        self.only.is_empty() || self.only.iter().any(|a| a == action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(args: &[&str]) -> ActionScope {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        ActionScope::from_args(&args)
    }

    #[test]
    fn test_empty_scope_applies_everywhere() {
        assert!(ActionScope::all().applies_to("anything"));
    }

    #[test]
    fn test_only() {
        let s = scope(&["edit", "delete"]);
        assert!(s.applies_to("edit"));
        assert!(!s.applies_to("index"));
    }

    #[test]
    fn test_except() {
        let s = scope(&["!index"]);
        assert!(!s.applies_to("index"));
        assert!(s.applies_to("edit"));
    }
}
