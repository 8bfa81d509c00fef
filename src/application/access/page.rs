use crate::domain::Role;

/// Where a page sits in the site hierarchy.
///
/// Role-area pages (`/admin/…`, `/teacher/…`, `/student/…`) are restricted
/// and live one directory below the login entry point; everything else is
/// public.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    path: String,
}

impl PageLocation {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        Self { path }
    }

    /// A page inside a role's area, e.g. `/teacher/dashboard.html`.
    pub fn in_area(role: Role, page: &str) -> Self {
        Self::new(format!("/{}/{}", role.as_str(), page.trim_start_matches('/')))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The role area the page belongs to, if any.
    pub fn area(&self) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| self.path.contains(&format!("/{}/", role.as_str())))
    }

    pub fn is_restricted(&self) -> bool {
        self.area().is_some()
    }

    /// The login entry point as seen from this page.
    pub fn login_url(&self, entry: &str) -> String {
        if self.is_restricted() {
            format!("../{}", entry)
        } else {
            entry.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restricted_areas() {
        assert_eq!(
            PageLocation::new("/app/student/book.html").area(),
            Some(Role::Student)
        );
        assert!(PageLocation::in_area(Role::Admin, "dashboard.html").is_restricted());
        assert!(!PageLocation::new("/index.html").is_restricted());
        assert!(!PageLocation::new("register.html").is_restricted());
    }

    #[test]
    fn test_login_url_depends_on_depth() {
        assert_eq!(
            PageLocation::in_area(Role::Teacher, "dashboard.html").login_url("index.html"),
            "../index.html"
        );
        assert_eq!(
            PageLocation::new("/register.html").login_url("index.html"),
            "index.html"
        );
    }

    #[test]
    fn test_relative_paths_are_anchored() {
        let page = PageLocation::new("student/dashboard.html");
        assert_eq!(page.path(), "/student/dashboard.html");
        assert!(page.is_restricted());
    }
}
