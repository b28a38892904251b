//! REST client for the center's content resources
//!
//! Every request carries `AuthGateway::auth_header()` (empty when signed
//! out). A 401/403 from any endpoint is treated as session loss: the gateway
//! signs out, subscribers see `Absent`, and the call fails with
//! `ApiError::SessionExpired`.
//!
//! Timeouts come from the `reqwest::Client` the caller builds; a timed-out
//! request is reported like any other transport failure.

use std::sync::Arc;

use center_auth::AuthGateway;
use center_auth::gateway::{error_detail, is_authorization_error};
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::error::{ApiError, Result};
use crate::models::{
    Appointment, AppointmentStatus, BlogPost, Contact, DashboardStats, NewAppointment,
    NewBlogPost, NewContact, NewProgram, NewsletterIssue, NewsletterReport,
    NewsletterSubscription, Program, SiteSettings,
};

/// Which blog posts a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlogScope {
    /// Public listing: backend default, published posts only
    Published,
    /// Admin listing: drafts included
    All,
}

#[derive(Debug, Clone, Copy)]
enum Access {
    Read,
    Write,
}

impl Access {
    fn fail(self, resource: &'static str, reason: String) -> ApiError {
        match self {
            Access::Read => ApiError::ResourceReadFailed { resource, reason },
            Access::Write => ApiError::ResourceWriteFailed { resource, reason },
        }
    }
}

#[derive(Serialize)]
struct StatusUpdate {
    status: AppointmentStatus,
}

#[derive(Serialize)]
struct Subscription<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct PrivacyPolicyUpdate<'a> {
    privacy_policy: &'a str,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    gateway: Arc<AuthGateway>,
}

impl ApiClient {
    /// Client for the backend the gateway authenticates against.
    pub fn new(http: reqwest::Client, gateway: Arc<AuthGateway>) -> Self {
        let base_url = gateway.base_url().to_owned();
        Self {
            http,
            base_url,
            gateway,
        }
    }

    pub fn gateway(&self) -> &Arc<AuthGateway> {
        &self.gateway
    }

    fn endpoint(&self, access: Access, resource: &'static str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| access.fail(resource, format!("invalid backend URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| access.fail(resource, "backend URL cannot carry a path".into()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    /// Send one request and map transport, authorization, and status errors.
    #[instrument(skip_all, fields(request_id = tracing::field::Empty, resource = resource, method = %method))]
    async fn execute<B: Serialize + ?Sized>(
        &self,
        access: Access,
        resource: &'static str,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
        tracing::Span::current().record("request_id", request_id.as_str());

        let mut request = self
            .http
            .request(method, url)
            .headers(self.gateway.auth_header());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "request failed");
            access.fail(resource, format!("backend unreachable: {e}"))
        })?;

        let status = response.status();
        if is_authorization_error(status) {
            self.gateway.expire_session();
            return Err(ApiError::SessionExpired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = error_detail(&body).unwrap_or_else(|| status.to_string());
            warn!(%status, %reason, "backend returned error");
            return Err(access.fail(resource, reason));
        }

        debug!(%status, "request completed");
        Ok(response)
    }

    async fn read<T: DeserializeOwned>(&self, resource: &'static str, url: Url) -> Result<T> {
        let response = self
            .execute::<()>(Access::Read, resource, Method::GET, url, None)
            .await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Access::Read.fail(resource, format!("invalid response body: {e}")))
    }

    async fn write<B, T>(&self, resource: &'static str, method: Method, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(Access::Write, resource, method, url, Some(body))
            .await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Access::Write.fail(resource, format!("invalid response body: {e}")))
    }

    /// Write whose response body carries nothing the client needs.
    async fn write_ack<B: Serialize + ?Sized>(
        &self,
        resource: &'static str,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<()> {
        self.execute(Access::Write, resource, method, url, body)
            .await
            .map(|_| ())
    }

    pub async fn programs(&self) -> Result<Vec<Program>> {
        let url = self.endpoint(Access::Read, "programs", &["programs"])?;
        self.read("programs", url).await
    }

    pub async fn program(&self, id: &str) -> Result<Program> {
        let url = self.endpoint(Access::Read, "program", &["programs", id])?;
        self.read("program", url).await
    }

    pub async fn create_program(&self, program: &NewProgram) -> Result<Program> {
        let url = self.endpoint(Access::Write, "programs", &["programs"])?;
        self.write("programs", Method::POST, url, program).await
    }

    pub async fn appointments(&self) -> Result<Vec<Appointment>> {
        let url = self.endpoint(Access::Read, "appointments", &["appointments"])?;
        self.read("appointments", url).await
    }

    pub async fn book_appointment(&self, booking: &NewAppointment) -> Result<Appointment> {
        let url = self.endpoint(Access::Write, "appointments", &["appointments"])?;
        self.write("appointments", Method::POST, url, booking).await
    }

    pub async fn set_appointment_status(&self, id: &str, status: AppointmentStatus) -> Result<()> {
        let url = self.endpoint(Access::Write, "appointments", &["appointments", id, "status"])?;
        self.write_ack("appointments", Method::PUT, url, Some(&StatusUpdate { status }))
            .await
    }

    pub async fn contacts(&self) -> Result<Vec<Contact>> {
        let url = self.endpoint(Access::Read, "contacts", &["contacts"])?;
        self.read("contacts", url).await
    }

    pub async fn submit_contact(&self, contact: &NewContact) -> Result<Contact> {
        let url = self.endpoint(Access::Write, "contacts", &["contacts"])?;
        self.write("contacts", Method::POST, url, contact).await
    }

    pub async fn subscribers(&self) -> Result<Vec<NewsletterSubscription>> {
        let url = self.endpoint(Access::Read, "newsletter", &["newsletter"])?;
        self.read("newsletter", url).await
    }

    pub async fn subscribe(&self, email: &str) -> Result<NewsletterSubscription> {
        let url = self.endpoint(Access::Write, "newsletter", &["newsletter"])?;
        self.write("newsletter", Method::POST, url, &Subscription { email })
            .await
    }

    pub async fn send_newsletter(&self, issue: &NewsletterIssue) -> Result<NewsletterReport> {
        let url = self.endpoint(Access::Write, "newsletter", &["newsletter", "send"])?;
        self.write("newsletter", Method::POST, url, issue).await
    }

    pub async fn blog_posts(&self, scope: BlogScope) -> Result<Vec<BlogPost>> {
        let mut url = self.endpoint(Access::Read, "blog", &["blog"])?;
        if scope == BlogScope::All {
            url.query_pairs_mut().append_pair("published_only", "false");
        }
        self.read("blog", url).await
    }

    pub async fn blog_post(&self, slug: &str) -> Result<BlogPost> {
        let url = self.endpoint(Access::Read, "blog post", &["blog", slug])?;
        self.read("blog post", url).await
    }

    pub async fn create_blog_post(&self, post: &NewBlogPost) -> Result<BlogPost> {
        let url = self.endpoint(Access::Write, "blog", &["blog"])?;
        self.write("blog", Method::POST, url, post).await
    }

    pub async fn delete_blog_post(&self, id: &str) -> Result<()> {
        let url = self.endpoint(Access::Write, "blog", &["blog", id])?;
        self.write_ack::<()>("blog", Method::DELETE, url, None).await
    }

    pub async fn settings(&self) -> Result<SiteSettings> {
        let url = self.endpoint(Access::Read, "settings", &["settings"])?;
        self.read("settings", url).await
    }

    pub async fn update_settings(&self, settings: &SiteSettings) -> Result<()> {
        let url = self.endpoint(Access::Write, "settings", &["settings"])?;
        self.write_ack("settings", Method::PUT, url, Some(settings))
            .await
    }

    pub async fn update_privacy_policy(&self, html: &str) -> Result<()> {
        let url = self.endpoint(Access::Write, "privacy policy", &["settings"])?;
        self.write_ack(
            "privacy policy",
            Method::PUT,
            url,
            Some(&PrivacyPolicyUpdate {
                privacy_policy: html,
            }),
        )
        .await
    }

    /// Counts for the dashboard cards, fetched concurrently.
    ///
    /// Any one failing fails the whole load; the dashboard then shows its
    /// error state rather than partial numbers.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let (appointments, contacts, newsletter, programs) = tokio::try_join!(
            self.appointments(),
            self.contacts(),
            self.subscribers(),
            self.programs(),
        )?;
        Ok(DashboardStats {
            appointments: appointments.len(),
            contacts: contacts.len(),
            newsletter: newsletter.len(),
            programs: programs.len(),
        })
    }
}
