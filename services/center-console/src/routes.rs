//! Route table for the public site and the admin panel
//!
//! Every `/admin/*` path except the login entry point is protected.

use center_auth::LOGIN_ROUTE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Programs,
    ProgramDetail(String),
    Blog,
    BlogPost(String),
    Contacts,
    Appointment,
    Privacy,
    Login,
    Dashboard,
    AdminAppointments,
    AdminContacts,
    AdminNewsletter,
    AdminPrograms,
    AdminBlog,
    AdminSettings,
    AdminPrivacy,
    NotFound(String),
}

impl Route {
    /// Resolve a path. Query strings and trailing slashes are ignored.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Home,
            ["programs"] => Route::Programs,
            ["programs", id] => Route::ProgramDetail((*id).to_owned()),
            ["blog"] => Route::Blog,
            ["blog", slug] => Route::BlogPost((*slug).to_owned()),
            ["contacts"] => Route::Contacts,
            ["appointment"] => Route::Appointment,
            ["privacy"] => Route::Privacy,
            ["admin", "login"] => Route::Login,
            ["admin"] => Route::Dashboard,
            ["admin", "appointments"] => Route::AdminAppointments,
            ["admin", "contacts"] => Route::AdminContacts,
            ["admin", "newsletter"] => Route::AdminNewsletter,
            ["admin", "programs"] => Route::AdminPrograms,
            ["admin", "blog"] => Route::AdminBlog,
            ["admin", "settings"] => Route::AdminSettings,
            ["admin", "privacy"] => Route::AdminPrivacy,
            _ => Route::NotFound(path.to_owned()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".into(),
            Route::Programs => "/programs".into(),
            Route::ProgramDetail(id) => format!("/programs/{id}"),
            Route::Blog => "/blog".into(),
            Route::BlogPost(slug) => format!("/blog/{slug}"),
            Route::Contacts => "/contacts".into(),
            Route::Appointment => "/appointment".into(),
            Route::Privacy => "/privacy".into(),
            Route::Login => LOGIN_ROUTE.into(),
            Route::Dashboard => "/admin".into(),
            Route::AdminAppointments => "/admin/appointments".into(),
            Route::AdminContacts => "/admin/contacts".into(),
            Route::AdminNewsletter => "/admin/newsletter".into(),
            Route::AdminPrograms => "/admin/programs".into(),
            Route::AdminBlog => "/admin/blog".into(),
            Route::AdminSettings => "/admin/settings".into(),
            Route::AdminPrivacy => "/admin/privacy".into(),
            Route::NotFound(path) => path.clone(),
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Route::Dashboard
                | Route::AdminAppointments
                | Route::AdminContacts
                | Route::AdminNewsletter
                | Route::AdminPrograms
                | Route::AdminBlog
                | Route::AdminSettings
                | Route::AdminPrivacy
        )
    }
}
