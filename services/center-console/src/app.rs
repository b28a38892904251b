//! Console application: boots the session, routes commands, renders pages
//!
//! Protected views and admin writes go through the route guard twice: once
//! before any data is requested, and again after, so a session that ended
//! while the request was in flight turns into a redirect.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use center_api::{
    ApiClient, ApiError, BlogFilter, BlogScope, BoundView, NewAppointment, NewBlogPost, NewContact,
    NewProgram, NewsletterIssue, Notice, Notices, ProgramCategory, SiteSettings,
};
use center_auth::{AuthGateway, GuardDecision, GuardOutcome, RouteGuard, VerificationState};
use chrono::NaiveTime;
use common::Secret;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::cli::{BookArgs, Command, ContactArgs, OpenArgs, SettingsArgs};
use crate::error::{Error, Result};
use crate::pages;
use crate::routes::Route;

pub struct App {
    gateway: Arc<AuthGateway>,
    api: ApiClient,
    notices: Notices,
}

impl App {
    pub fn new(gateway: Arc<AuthGateway>, api: ApiClient) -> Self {
        Self {
            gateway,
            api,
            notices: Notices::new(),
        }
    }

    /// Take every notice posted so far.
    pub fn drain_notices(&self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// Run one command and return the text to print.
    ///
    /// `password` is only consulted by `login`.
    pub async fn execute(&self, command: Command, password: Option<Secret<String>>) -> Result<String> {
        if command.restores_session() {
            let state = self.gateway.verify_on_boot().await;
            debug!(state = state.label(), "session restored");
        }

        match command {
            Command::Open(args) => self.open(&args).await,
            Command::Login(args) => {
                let password = password.ok_or_else(|| {
                    Error::InvalidInput("no password given (use --password-stdin or CENTER_ADMIN_PASSWORD)".into())
                })?;
                self.login(&args.username, &password).await
            }
            Command::Logout => Ok(self.logout()),
            Command::Status => Ok(self.status()),
            Command::AppointmentStatus { id, status } => {
                let guard = self.require_admin().await?;
                let view = self.mount("appointments", self.api.appointments()).await;
                let result = view
                    .write(
                        &self.notices,
                        self.api.set_appointment_status(&id, status),
                        || self.api.appointments(),
                        "Status updated",
                        "Failed to update status",
                    )
                    .await;
                self.after_write(&guard, result, || pages::admin_appointments(&view.state()))
            }
            Command::CreateProgram { file } => {
                let program: NewProgram = read_json(&file)?;
                let guard = self.require_admin().await?;
                let view = self.mount("programs", self.api.programs()).await;
                let result = view
                    .write(
                        &self.notices,
                        self.api.create_program(&program),
                        || self.api.programs(),
                        "Program created",
                        "Failed to create program",
                    )
                    .await;
                self.after_write(&guard, result, || pages::admin_programs(&view.state()))
            }
            Command::CreatePost { file } => {
                let post: NewBlogPost = read_json(&file)?;
                let guard = self.require_admin().await?;
                let view = self.mount("blog", self.api.blog_posts(BlogScope::All)).await;
                let result = view
                    .write(
                        &self.notices,
                        self.api.create_blog_post(&post),
                        || self.api.blog_posts(BlogScope::All),
                        "Post created",
                        "Failed to create post",
                    )
                    .await;
                self.after_write(&guard, result, || pages::admin_blog(&view.state()))
            }
            Command::DeletePost { id } => {
                let guard = self.require_admin().await?;
                let view = self.mount("blog", self.api.blog_posts(BlogScope::All)).await;
                let result = view
                    .write(
                        &self.notices,
                        self.api.delete_blog_post(&id),
                        || self.api.blog_posts(BlogScope::All),
                        "Post deleted",
                        "Failed to delete post",
                    )
                    .await;
                self.after_write(&guard, result, || pages::admin_blog(&view.state()))
            }
            Command::UpdateSettings(args) => self.update_settings(&args).await,
            Command::SetPrivacy { file } => {
                let html = read_text(&file)?;
                let guard = self.require_admin().await?;
                let view = self.mount("settings", self.api.settings()).await;
                let result = view
                    .write(
                        &self.notices,
                        self.api.update_privacy_policy(&html),
                        || self.api.settings(),
                        "Privacy policy saved",
                        "Failed to save privacy policy",
                    )
                    .await;
                self.after_write(&guard, result, || pages::admin_privacy(&view.state()))
            }
            Command::SendNewsletter { subject, file } => {
                let issue = NewsletterIssue {
                    subject: subject.trim().to_owned(),
                    html_content: read_text(&file)?,
                };
                self.send_newsletter(&issue).await
            }
            Command::Contact(args) => self.contact(args).await,
            Command::Book(args) => self.book(args).await,
            Command::Subscribe { email } => {
                let email = email.trim();
                if email.is_empty() {
                    return Err(Error::InvalidInput("email is required".into()));
                }
                self.public_write(self.api.subscribe(email), "Subscribed to the newsletter", "Failed to subscribe")
                    .await
            }
        }
    }

    async fn open(&self, args: &OpenArgs) -> Result<String> {
        let route = Route::parse(&args.path);
        if route.is_protected() {
            return self.open_admin(&route).await;
        }
        let page = match &route {
            Route::Home => pages::home(&self.mount("programs", self.api.programs()).await.state()),
            Route::Programs => pages::programs(
                &self.mount("programs", self.api.programs()).await.state(),
                args.category,
            ),
            Route::ProgramDetail(id) => {
                pages::program_detail(&self.mount("program", self.api.program(id)).await.state())
            }
            Route::Blog => {
                let filter = BlogFilter {
                    search: args.search.clone(),
                    tag: args.tag.clone(),
                };
                let posts = self.mount("blog", self.api.blog_posts(BlogScope::Published)).await;
                pages::blog(&posts.state(), &filter)
            }
            Route::BlogPost(slug) => {
                let (post, related) = tokio::join!(
                    self.mount("blog post", self.api.blog_post(slug)),
                    self.mount("related posts", self.api.blog_posts(BlogScope::Published)),
                );
                pages::blog_post(&post.state(), &related.state())
            }
            Route::Contacts => pages::contacts(&self.mount("settings", self.api.settings()).await.state()),
            Route::Appointment => {
                pages::appointment(&self.mount("programs", self.api.programs()).await.state())
            }
            Route::Privacy => pages::privacy(&self.mount("settings", self.api.settings()).await.state()),
            Route::Login => {
                let session = self.gateway.session();
                let username = if session.is_verified() {
                    session.username.as_deref()
                } else {
                    None
                };
                pages::login(username)
            }
            Route::NotFound(path) => pages::not_found(path),
            _ => pages::not_found(&route.path()),
        };
        Ok(page)
    }

    async fn open_admin(&self, route: &Route) -> Result<String> {
        let guard = self.require_admin().await?;
        let page = match route {
            Route::Dashboard => {
                let stats = self.mount("dashboard", self.api.dashboard_stats()).await;
                let username = self.gateway.session().username;
                pages::dashboard(&stats.state(), username.as_deref())
            }
            Route::AdminAppointments => {
                pages::admin_appointments(&self.mount("appointments", self.api.appointments()).await.state())
            }
            Route::AdminContacts => {
                pages::admin_contacts(&self.mount("contacts", self.api.contacts()).await.state())
            }
            Route::AdminNewsletter => {
                pages::admin_newsletter(&self.mount("newsletter", self.api.subscribers()).await.state())
            }
            Route::AdminPrograms => {
                pages::admin_programs(&self.mount("programs", self.api.programs()).await.state())
            }
            Route::AdminBlog => pages::admin_blog(
                &self.mount("blog", self.api.blog_posts(BlogScope::All)).await.state(),
            ),
            Route::AdminSettings => {
                pages::admin_settings(&self.mount("settings", self.api.settings()).await.state())
            }
            Route::AdminPrivacy => {
                pages::admin_privacy(&self.mount("settings", self.api.settings()).await.state())
            }
            other => pages::not_found(&other.path()),
        };
        through_guard(&guard, page)
    }

    async fn login(&self, username: &str, password: &Secret<String>) -> Result<String> {
        if username.trim().is_empty() || password.is_blank() {
            return Err(Error::InvalidInput("username and password are required".into()));
        }
        let credential = self.gateway.login(username.trim(), password).await?;
        info!(username = %credential.username, "signed in");
        let open = OpenArgs {
            path: Route::Dashboard.path(),
            search: None,
            tag: None,
            category: ProgramCategory::All,
        };
        let dashboard = self.open(&open).await?;
        Ok(format!("Signed in as {}.\n\n{dashboard}", credential.username))
    }

    fn logout(&self) -> String {
        self.gateway.logout();
        "Signed out.\n".into()
    }

    fn status(&self) -> String {
        let session = self.gateway.session();
        match (session.state, session.username) {
            (VerificationState::Verified, Some(username)) => format!("Signed in as {username}.\n"),
            (state, _) => format!("Not signed in ({}).\n", state.label()),
        }
    }

    async fn update_settings(&self, args: &SettingsArgs) -> Result<String> {
        if args.is_empty() {
            return Err(Error::InvalidInput("nothing to update; pass at least one field".into()));
        }
        let guard = self.require_admin().await?;
        let view = self.mount("settings", self.api.settings()).await;
        // Without the current values a PUT would blank every omitted field
        let Some(current) = view.state().ready().cloned() else {
            through_guard(&guard, String::new())?;
            self.notices
                .error("Failed to save settings: current settings could not be loaded");
            return Err(ApiError::ResourceWriteFailed {
                resource: "settings",
                reason: "current settings could not be loaded".into(),
            }
            .into());
        };
        let updated = merge_settings(current, args);
        let result = view
            .write(
                &self.notices,
                self.api.update_settings(&updated),
                || self.api.settings(),
                "Settings saved",
                "Failed to save settings",
            )
            .await;
        self.after_write(&guard, result, || pages::admin_settings(&view.state()))
    }

    async fn send_newsletter(&self, issue: &NewsletterIssue) -> Result<String> {
        if issue.subject.is_empty() || issue.html_content.trim().is_empty() {
            return Err(Error::InvalidInput("subject and message body are required".into()));
        }
        let guard = self.require_admin().await?;
        let view = self.mount("newsletter", self.api.subscribers()).await;
        let result = view
            .write(
                &self.notices,
                self.api.send_newsletter(issue),
                || self.api.subscribers(),
                "Newsletter sent",
                "Failed to send newsletter",
            )
            .await;
        if let Ok(report) = &result {
            self.notices
                .success(format!("Delivered: {}, failed: {}", report.sent, report.failed));
        }
        self.after_write(&guard, result, || pages::admin_newsletter(&view.state()))
    }

    async fn contact(&self, args: ContactArgs) -> Result<String> {
        let contact = NewContact {
            name: args.name,
            email: args.email,
            phone: args.phone.filter(|p| !p.trim().is_empty()),
            subject: args.subject,
            message: args.message,
        };
        self.public_write(
            self.api.submit_contact(&contact),
            "Message sent",
            "Failed to send message",
        )
        .await
    }

    async fn book(&self, args: BookArgs) -> Result<String> {
        let booking = NewAppointment {
            program_id: args.program,
            client_name: args.name,
            client_phone: args.phone,
            client_email: args.email,
            child_name: args.child_name.filter(|n| !n.trim().is_empty()),
            child_age: args.child_age,
            preferred_date: args.date.and_time(NaiveTime::MIN),
            preferred_time: args.time.format("%H:%M").to_string(),
            message: args.message.filter(|m| !m.trim().is_empty()),
        };
        self.public_write(
            self.api.book_appointment(&booking),
            "Appointment request sent",
            "Failed to send appointment request",
        )
        .await
    }

    /// Public form submission: no guard, no bound view, just a notice.
    async fn public_write<U>(
        &self,
        write: impl Future<Output = center_api::Result<U>>,
        success: &str,
        failure: &str,
    ) -> Result<String> {
        match write.await {
            Ok(_) => {
                self.notices.success(success);
                Ok(String::new())
            }
            Err(e) => {
                self.notices.error(format!("{failure}: {e}"));
                Err(e.into())
            }
        }
    }

    /// Wait for the session to settle and refuse unless it is verified.
    async fn require_admin(&self) -> Result<RouteGuard> {
        let mut guard = RouteGuard::new(self.gateway.watch());
        match guard.settled().await {
            GuardDecision::Render => Ok(guard),
            GuardDecision::Redirect(route) => Err(Error::Redirected(route)),
            GuardDecision::Wait => Err(Error::Redirected(guard.login_route().to_owned())),
        }
    }

    /// Bind a view to one resource and issue its initial read.
    async fn mount<T, F>(&self, resource: &'static str, fetch: F) -> BoundView<T>
    where
        F: Future<Output = center_api::Result<T>>,
    {
        let view = BoundView::new(resource);
        view.load(fetch).await;
        view
    }

    /// Re-render the refreshed view unless the session ended meanwhile.
    fn after_write<U>(
        &self,
        guard: &RouteGuard,
        result: center_api::Result<U>,
        render: impl FnOnce() -> String,
    ) -> Result<String> {
        let page = through_guard(guard, render())?;
        result?;
        Ok(page)
    }
}

fn through_guard(guard: &RouteGuard, page: String) -> Result<String> {
    match guard.render(|| page) {
        GuardOutcome::Rendered(page) => Ok(page),
        GuardOutcome::Redirected(route) => Err(Error::Redirected(route)),
        GuardOutcome::Waiting => Err(Error::Redirected(guard.login_route().to_owned())),
    }
}

fn merge_settings(mut settings: SiteSettings, args: &SettingsArgs) -> SiteSettings {
    let fields = [
        (&mut settings.phone, &args.phone),
        (&mut settings.email, &args.email),
        (&mut settings.address, &args.address),
        (&mut settings.work_schedule, &args.work_schedule),
        (&mut settings.vk_link, &args.vk_link),
    ];
    for (slot, value) in fields {
        if let Some(value) = value {
            *slot = value.clone();
        }
    }
    settings
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Input {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|source| Error::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}
