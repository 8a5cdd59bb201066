//! Path to screen mapping.

use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Chat,
    KnowledgeBase,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Chat => "/",
            Route::KnowledgeBase => "/knowledge-base",
        }
    }
}

/// Result of resolving a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    /// Unknown path; the caller should navigate to the target instead.
    Redirect(Route),
}

impl Resolution {
    /// The screen that ends up shown.
    pub fn route(self) -> Route {
        match self {
            Resolution::Render(r) | Resolution::Redirect(r) => r,
        }
    }
}

/// Query strings, fragments and a trailing slash are ignored.
pub fn resolve(path: &str) -> Resolution {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    match trimmed {
        "" => Resolution::Render(Route::Chat),
        "/knowledge-base" => Resolution::Render(Route::KnowledgeBase),
        _ => Resolution::Redirect(Route::Chat),
    }
}

/// CLI entry point for `studyflow route <path>`.
pub fn run_route(path: &str) -> Result<()> {
    match resolve(path) {
        Resolution::Render(r) => println!("{} -> {:?}", path, r),
        Resolution::Redirect(r) => println!("{} -> redirect {} ({:?})", path, r.path(), r),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_paths() {
        assert_eq!(resolve("/"), Resolution::Render(Route::Chat));
        assert_eq!(
            resolve("/knowledge-base"),
            Resolution::Render(Route::KnowledgeBase)
        );
        assert_eq!(
            resolve("/knowledge-base/?tab=1"),
            Resolution::Render(Route::KnowledgeBase)
        );
    }

    #[test]
    fn test_unknown_paths_redirect_to_chat() {
        for p in ["/settings", "/knowledge-base/extra", "/chat", "nonsense"] {
            assert_eq!(resolve(p), Resolution::Redirect(Route::Chat), "{}", p);
        }
        assert_eq!(resolve("/missing").route().path(), "/");
    }
}
