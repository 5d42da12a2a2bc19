use crate::config::PriorityRule;
use crate::error::{AppError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use log;

/// Rank given to paths that match no rule; sorts after every declared rank.
pub const UNRANKED: u32 = 999;

/// Maps module-relative paths to their presentation rank.
///
/// Exact rules are consulted before glob rules, and within each group the
/// first declared rule wins. `*` crosses directory separators, so
/// `models/*.py` also ranks `models/sub/x.py`.
#[derive(Debug, Clone)]
pub struct PriorityResolver {
    exact: Vec<(String, u32)>,
    glob_set: GlobSet,
    glob_ranks: Vec<u32>,
}

impl PriorityResolver {
    pub fn new(rules: &[PriorityRule]) -> Result<Self> {
        let mut exact = Vec::new();
        let mut builder = GlobSetBuilder::new();
        let mut glob_ranks = Vec::new();

        for rule in rules {
            let pattern = normalize_separators(rule.pattern.trim());
            if pattern.contains('*') {
                let glob = Glob::new(&pattern).map_err(|e| {
                    log::error!("Invalid priority pattern \"{}\": {}", rule.pattern, e);
                    AppError::Glob(format!(
                        "Invalid priority pattern \"{}\": {}",
                        rule.pattern, e
                    ))
                })?;
                log::trace!("Adding priority glob: {} => {}", pattern, rule.rank);
                builder.add(glob);
                glob_ranks.push(rule.rank);
            } else {
                log::trace!("Adding exact priority: {} => {}", pattern, rule.rank);
                exact.push((pattern, rule.rank));
            }
        }

        let glob_set = builder.build()?;
        Ok(Self {
            exact,
            glob_set,
            glob_ranks,
        })
    }

    pub fn priority_of(&self, relative_path: &str) -> u32 {
        let normalized = normalize_separators(relative_path);

        if let Some((_, rank)) = self.exact.iter().find(|(pattern, _)| *pattern == normalized) {
            return *rank;
        }

        self.glob_set
            .matches(normalized.as_str())
            .into_iter()
            .min()
            .map(|index| self.glob_ranks[index])
            .unwrap_or(UNRANKED)
    }
}

fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn resolver() -> PriorityResolver {
        PriorityResolver::new(&Config::default().priority).unwrap()
    }

    #[test]
    fn manifest_and_init_come_first() {
        let r = resolver();
        assert_eq!(r.priority_of("__manifest__.py"), 1);
        assert_eq!(r.priority_of("__init__.py"), 2);
    }

    #[test]
    fn nested_init_falls_through_to_globs() {
        let r = resolver();
        assert_eq!(r.priority_of("models/__init__.py"), 3);
        assert_eq!(r.priority_of("tests/__init__.py"), UNRANKED);
    }

    #[test]
    fn glob_star_crosses_directories() {
        let r = resolver();
        assert_eq!(r.priority_of("static/src/js/widget.js"), 9);
        assert_eq!(r.priority_of("models/sub/partner.py"), 3);
    }

    #[test]
    fn backslashes_are_normalized() {
        assert_eq!(resolver().priority_of("views\\sale_views.xml"), 4);
    }

    #[test]
    fn unmatched_paths_get_the_sentinel() {
        let r = resolver();
        assert_eq!(r.priority_of("README.txt"), UNRANKED);
        assert_eq!(r.priority_of("i18n/fr.po"), UNRANKED);
    }

    #[test]
    fn exact_rules_beat_earlier_globs() {
        let rules = vec![
            PriorityRule::new("*.py", 5),
            PriorityRule::new("setup.py", 1),
        ];
        let r = PriorityResolver::new(&rules).unwrap();
        assert_eq!(r.priority_of("setup.py"), 1);
        assert_eq!(r.priority_of("other.py"), 5);
    }

    #[test]
    fn first_declared_glob_wins() {
        let rules = vec![
            PriorityRule::new("models/*", 7),
            PriorityRule::new("*.py", 2),
        ];
        let r = PriorityResolver::new(&rules).unwrap();
        assert_eq!(r.priority_of("models/a.py"), 7);
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let rules = vec![PriorityRule::new("models/[*.py", 1)];
        assert!(matches!(
            PriorityResolver::new(&rules),
            Err(AppError::Glob(_))
        ));
    }
}
