//! Text rendering for every public and admin view
//!
//! Pure functions from view state to text. Nothing here touches the
//! network or the session.

use center_api::filters::all_tags;
use center_api::{
    Appointment, BlogFilter, BlogPost, Contact, DashboardStats, Notice, NoticeLevel,
    NewsletterSubscription, Program, ProgramCategory, SiteSettings, ViewState,
};
use chrono::NaiveDateTime;

const HOME_PROGRAMS: usize = 3;
const RELATED_POSTS: usize = 3;

/// Line-oriented page builder.
#[derive(Default)]
struct Page {
    lines: Vec<String>,
}

impl Page {
    fn titled(title: &str) -> Self {
        let mut page = Page::default();
        page.line(title);
        page.line("=".repeat(title.chars().count()));
        page
    }

    fn line(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push(text.into());
        self
    }

    fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    fn section(&mut self, title: &str) -> &mut Self {
        self.blank();
        self.line(title);
        self.line("-".repeat(title.chars().count()));
        self
    }

    /// `label: value`, skipped when the value is empty.
    fn field(&mut self, label: &str, value: &str) -> &mut Self {
        if !value.trim().is_empty() {
            self.line(format!("{label}: {value}"));
        }
        self
    }

    fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

fn date(ts: &NaiveDateTime) -> String {
    ts.format("%d.%m.%Y").to_string()
}

fn date_time(ts: &NaiveDateTime) -> String {
    ts.format("%d.%m.%Y %H:%M").to_string()
}

fn rub(price: i64) -> String {
    format!("{price} RUB")
}

/// Render a data-backed view: loading placeholder, empty/error state, or
/// the body for loaded data.
fn bound<T>(title: &str, state: &ViewState<T>, body: impl FnOnce(&mut Page, &T)) -> String {
    let mut page = Page::titled(title);
    match state {
        ViewState::Loading => {
            page.line("Loading...");
        }
        ViewState::Failed(reason) => {
            page.line("Nothing to show right now.");
            page.line(format!("({reason})"));
        }
        ViewState::Ready(data) => body(&mut page, data),
    }
    page.finish()
}

pub fn home(programs: &ViewState<Vec<Program>>) -> String {
    bound("Psychology & Development Center", programs, |page, programs| {
        page.line("Support for children, teens and adults.");
        page.section("Our programs");
        if programs.is_empty() {
            page.line("No programs yet.");
        }
        for program in programs.iter().take(HOME_PROGRAMS) {
            page.line(format!(
                "* {} ({}, from {})",
                program.title,
                program.program_type.label(),
                rub(program.price)
            ));
        }
        page.blank();
        page.line("All programs: /programs  Book a visit: /appointment");
    })
}

pub fn programs(programs: &ViewState<Vec<Program>>, category: ProgramCategory) -> String {
    bound("Programs", programs, |page, programs| {
        let shown = category.apply(programs);
        if shown.is_empty() {
            page.line("No programs in this category.");
        }
        for program in shown {
            page.blank();
            page.line(format!("{} [{}]", program.title, program.id));
            page.line(format!(
                "  {} | ages {} | {} | {}",
                program.program_type.label(),
                program.age_range,
                program.duration,
                rub(program.price)
            ));
            for goal in program.goals.iter().take(2) {
                page.line(format!("  - {goal}"));
            }
        }
    })
}

pub fn program_detail(program: &ViewState<Program>) -> String {
    let title = program.ready().map_or("Program", |p| p.title.as_str());
    bound(title, program, |page, program| {
        page.field("Type", program.program_type.label())
            .field("Ages", &program.age_range)
            .field("Duration", &program.duration)
            .field("Price", &rub(program.price));
        page.blank();
        page.line(program.description.as_str());
        if !program.goals.is_empty() {
            page.section("Goals");
            for goal in &program.goals {
                page.line(format!("- {goal}"));
            }
        }
        if !program.faq.is_empty() {
            page.section("FAQ");
            for entry in &program.faq {
                page.line(format!("Q: {}", entry.question));
                page.line(format!("A: {}", entry.answer));
            }
        }
        page.blank();
        page.line(format!("Book this program: /appointment (program id {})", program.id));
    })
}

pub fn blog(posts: &ViewState<Vec<BlogPost>>, filter: &BlogFilter) -> String {
    bound("Blog", posts, |page, posts| {
        let tags = all_tags(posts);
        if !tags.is_empty() {
            page.line(format!("Tags: {}", tags.join(", ")));
        }
        let shown = filter.apply(posts);
        if shown.is_empty() {
            page.line("No posts found.");
        }
        for post in shown {
            page.blank();
            page.line(format!("{} ({})", post.title, date(&post.created_at)));
            page.line(format!("  {}", post.excerpt));
            page.line(format!("  /blog/{}", post.slug));
        }
    })
}

/// A single post, followed by up to three other published posts. The
/// related section is left out unless its own read succeeded.
pub fn blog_post(post: &ViewState<BlogPost>, related: &ViewState<Vec<BlogPost>>) -> String {
    let title = post.ready().map_or("Blog", |p| p.title.as_str());
    bound(title, post, |page, post| {
        page.line(format!("{} | {}", post.author, date(&post.created_at)));
        if !post.tags.is_empty() {
            page.line(format!("Tags: {}", post.tags.join(", ")));
        }
        page.blank();
        page.line(post.content.as_str());

        let others: Vec<_> = related
            .ready()
            .into_iter()
            .flatten()
            .filter(|other| other.slug != post.slug)
            .take(RELATED_POSTS)
            .collect();
        if !others.is_empty() {
            page.section("Related posts");
            for other in others {
                page.line(format!("{}  /blog/{}", other.title, other.slug));
            }
        }
    })
}

pub fn contacts(settings: &ViewState<SiteSettings>) -> String {
    bound("Contacts", settings, |page, settings| {
        page.field("Phone", &settings.phone)
            .field("Email", &settings.email)
            .field("Address", &settings.address)
            .field("Hours", &settings.work_schedule)
            .field("VK", &settings.vk_link);
        page.blank();
        page.line("Send us a message: center-admin contact --name .. --email .. --subject .. --message ..");
    })
}

pub fn appointment(programs: &ViewState<Vec<Program>>) -> String {
    bound("Book an appointment", programs, |page, programs| {
        page.line("Choose a program:");
        for program in programs {
            page.line(format!("  {}  {}", program.id, program.title));
        }
        page.blank();
        page.line("center-admin book --program <id> --name .. --phone .. --email .. --date YYYY-MM-DD --time HH:MM");
    })
}

pub fn privacy(settings: &ViewState<SiteSettings>) -> String {
    bound("Privacy policy", settings, |page, settings| {
        match settings.privacy_policy.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(policy) => page.line(policy),
            None => page.line("The privacy policy has not been published yet."),
        };
    })
}

pub fn login(signed_in_as: Option<&str>) -> String {
    let mut page = Page::titled("Admin sign-in");
    match signed_in_as {
        Some(username) => page.line(format!("Signed in as {username}.")),
        None => page.line("Sign in with: center-admin login --username <name>"),
    };
    page.finish()
}

pub fn not_found(path: &str) -> String {
    let mut page = Page::titled("Page not found");
    page.line(format!("Nothing lives at {path}."));
    page.finish()
}

pub fn dashboard(stats: &ViewState<DashboardStats>, username: Option<&str>) -> String {
    bound("Dashboard", stats, |page, stats| {
        if let Some(username) = username {
            page.line(format!("Welcome, {username}"));
            page.blank();
        }
        page.line(format!("Appointments:  {}", stats.appointments));
        page.line(format!("Messages:      {}", stats.contacts));
        page.line(format!("Subscribers:   {}", stats.newsletter));
        page.line(format!("Programs:      {}", stats.programs));
    })
}

pub fn admin_appointments(appointments: &ViewState<Vec<Appointment>>) -> String {
    bound("Appointments", appointments, |page, appointments| {
        if appointments.is_empty() {
            page.line("No appointments.");
        }
        for a in appointments {
            page.blank();
            page.line(format!(
                "[{}] {} - {} {}",
                a.status.as_str(),
                a.client_name,
                date(&a.preferred_date),
                a.preferred_time
            ));
            page.line(format!("  id {} | program {}", a.id, a.program_id));
            page.line(format!("  {} | {}", a.client_phone, a.client_email));
            if let Some(child) = &a.child_name {
                let age = a.child_age.map(|age| format!(", {age} y.o.")).unwrap_or_default();
                page.line(format!("  child: {child}{age}"));
            }
            if let Some(message) = a.message.as_deref().filter(|m| !m.is_empty()) {
                page.line(format!("  \"{message}\""));
            }
        }
    })
}

pub fn admin_contacts(contacts: &ViewState<Vec<Contact>>) -> String {
    bound("Messages", contacts, |page, contacts| {
        if contacts.is_empty() {
            page.line("No messages.");
        }
        for c in contacts {
            page.blank();
            page.line(format!("{} | {} ({})", c.subject, c.name, date_time(&c.created_at)));
            let phone = c.phone.as_deref().unwrap_or_default();
            page.line(format!("  {} {}", c.email, phone).trim_end().to_owned());
            page.line(format!("  {}", c.message));
        }
    })
}

pub fn admin_newsletter(subscribers: &ViewState<Vec<NewsletterSubscription>>) -> String {
    bound("Newsletter", subscribers, |page, subscribers| {
        page.line(format!("{} subscribers", subscribers.len()));
        for s in subscribers {
            page.line(format!("  {} (since {})", s.email, date(&s.subscribed_at)));
        }
    })
}

pub fn admin_programs(programs: &ViewState<Vec<Program>>) -> String {
    bound("Programs", programs, |page, programs| {
        if programs.is_empty() {
            page.line("No programs.");
        }
        for p in programs {
            page.line(format!(
                "{}  {} ({}, {})",
                p.id,
                p.title,
                p.program_type.label(),
                rub(p.price)
            ));
        }
    })
}

pub fn admin_blog(posts: &ViewState<Vec<BlogPost>>) -> String {
    bound("Blog posts", posts, |page, posts| {
        if posts.is_empty() {
            page.line("No posts.");
        }
        for p in posts {
            let status = if p.published { "published" } else { "draft" };
            page.line(format!("{}  {} [{}] /blog/{}", p.id, p.title, status, p.slug));
        }
    })
}

pub fn admin_settings(settings: &ViewState<SiteSettings>) -> String {
    bound("Site settings", settings, |page, s| {
        page.line(format!("phone:         {}", s.phone));
        page.line(format!("email:         {}", s.email));
        page.line(format!("address:       {}", s.address));
        page.line(format!("work_schedule: {}", s.work_schedule));
        page.line(format!("vk_link:       {}", s.vk_link));
    })
}

pub fn admin_privacy(settings: &ViewState<SiteSettings>) -> String {
    bound("Privacy policy", settings, |page, s| {
        match s.privacy_policy.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(policy) => {
                page.line(format!("{} characters of HTML", policy.chars().count()));
                page.blank();
                page.line(policy);
            }
            None => {
                page.line("No policy saved yet.");
            }
        }
    })
}

pub fn notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|n| match n.level {
            NoticeLevel::Success => format!("[ok] {}\n", n.message),
            NoticeLevel::Error => format!("[error] {}\n", n.message),
        })
        .collect()
}
