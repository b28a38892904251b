//! Client-side filtering for the public listings

use crate::models::{BlogPost, Program, ProgramType};

/// Search and tag selection for the blog listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogFilter {
    pub search: Option<String>,
    pub tag: Option<String>,
}

impl BlogFilter {
    /// Case-insensitive substring match on title or excerpt, plus exact tag
    /// match. Blank criteria match everything.
    pub fn matches(&self, post: &BlogPost) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                post.title.to_lowercase().contains(&term)
                    || post.excerpt.to_lowercase().contains(&term)
            }
        };
        let tag_ok = match self.tag.as_deref() {
            None | Some("") => true,
            Some(tag) => post.tags.iter().any(|t| t == tag),
        };
        search_ok && tag_ok
    }

    pub fn apply<'a>(&self, posts: &'a [BlogPost]) -> Vec<&'a BlogPost> {
        posts.iter().filter(|p| self.matches(p)).collect()
    }
}

/// Distinct tags across `posts`, in first-seen order.
pub fn all_tags(posts: &[BlogPost]) -> Vec<&str> {
    let mut tags: Vec<&str> = Vec::new();
    for tag in posts.iter().flat_map(|p| p.tags.iter()) {
        if !tags.contains(&tag.as_str()) {
            tags.push(tag);
        }
    }
    tags
}

/// Category tabs on the public programs page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgramCategory {
    #[default]
    All,
    Children,
    Adults,
    Group,
    Individual,
}

impl ProgramCategory {
    pub fn matches(self, program_type: ProgramType) -> bool {
        use ProgramType::*;
        match self {
            ProgramCategory::All => true,
            ProgramCategory::Children => matches!(
                program_type,
                Preschool | EarlyDevelopment | IndividualChild | GroupChild
            ),
            ProgramCategory::Adults => matches!(program_type, IndividualAdult | GoalSetting),
            ProgramCategory::Group => program_type == GroupChild,
            ProgramCategory::Individual => {
                matches!(program_type, IndividualChild | IndividualAdult)
            }
        }
    }

    pub fn apply(self, programs: &[Program]) -> Vec<&Program> {
        programs
            .iter()
            .filter(|p| self.matches(p.program_type))
            .collect()
    }
}

impl std::str::FromStr for ProgramCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ProgramCategory::All),
            "children" => Ok(ProgramCategory::Children),
            "adults" => Ok(ProgramCategory::Adults),
            "group" => Ok(ProgramCategory::Group),
            "individual" => Ok(ProgramCategory::Individual),
            other => Err(format!(
                "unknown program category {other:?} (expected all, children, adults, group or individual)"
            )),
        }
    }
}
