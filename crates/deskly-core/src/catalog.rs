// ── Entity catalog ──
//
// The content types the dashboard manages, with their REST collection
// paths and list schemas. One generic controller serves all of them.

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

use crate::query::SortDirection::{Ascending, Descending};
use crate::schema::{EntitySchema, FilterRule, SortKind};

const PUBLISH_STATUSES: [&str; 3] = ["draft", "published", "archived"];
const ACTIVE_STATUSES: [&str; 2] = ["active", "inactive"];
const REQUEST_STATUSES: [&str; 4] = ["pending", "accepted", "replied", "declined"];

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Entity {
    Blogs,
    News,
    Careers,
    Applications,
    Products,
    Services,
    Projects,
    Testimonials,
    Faqs,
    Teams,
    NewsletterSubscribers,
    NewsletterCampaigns,
    ContactRequests,
    PartnershipRequests,
    ProjectRequests,
}

impl Entity {
    /// Collection path relative to the API base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Blogs => "/blogs",
            Self::News => "/news",
            Self::Careers => "/careers",
            Self::Applications => "/applications",
            Self::Products => "/products",
            Self::Services => "/services",
            Self::Projects => "/projects",
            Self::Testimonials => "/testimonials",
            Self::Faqs => "/faqs",
            Self::Teams => "/teams",
            Self::NewsletterSubscribers => "/newsletter/subscribers",
            Self::NewsletterCampaigns => "/newsletter/campaigns",
            Self::ContactRequests => "/contact",
            Self::PartnershipRequests => "/partnership",
            Self::ProjectRequests => "/project-requests",
        }
    }

    /// Human-readable singular noun for notices.
    pub fn singular(self) -> &'static str {
        match self {
            Self::Blogs => "blog post",
            Self::News => "news article",
            Self::Careers => "job posting",
            Self::Applications => "application",
            Self::Products => "product",
            Self::Services => "service",
            Self::Projects => "project",
            Self::Testimonials => "testimonial",
            Self::Faqs => "FAQ",
            Self::Teams => "team member",
            Self::NewsletterSubscribers => "subscriber",
            Self::NewsletterCampaigns => "campaign",
            Self::ContactRequests => "contact request",
            Self::PartnershipRequests => "partnership request",
            Self::ProjectRequests => "project request",
        }
    }

    /// Whether the backend exposes a slug lookup for this entity.
    pub fn has_slug(self) -> bool {
        matches!(
            self,
            Self::Blogs | Self::News | Self::Careers | Self::Products | Self::Services | Self::Projects
        )
    }

    #[allow(clippy::too_many_lines)]
    pub fn schema(self) -> EntitySchema {
        let base = EntitySchema::new(self.singular(), self.endpoint());
        match self {
            Self::Blogs => base
                .search(["title", "excerpt", "author", "tags"])
                .filter_eq("status")
                .filter_eq("category")
                .filter("tag", FilterRule::Equals("tags".into()))
                .sort("title", SortKind::Text)
                .sort("createdAt", SortKind::Date)
                .sort("publishedAt", SortKind::Date)
                .sort("views", SortKind::Number)
                .default_sort("createdAt", Descending)
                .columns(["id", "title", "category", "status", "createdAt"])
                .statuses(PUBLISH_STATUSES),
            Self::News => base
                .search(["title", "summary", "author"])
                .filter_eq("status")
                .filter_eq("category")
                .sort("title", SortKind::Text)
                .sort("createdAt", SortKind::Date)
                .sort("publishedAt", SortKind::Date)
                .default_sort("createdAt", Descending)
                .columns(["id", "title", "category", "status", "publishedAt"])
                .statuses(PUBLISH_STATUSES),
            Self::Careers => base
                .search(["title", "department", "location"])
                .filter_eq("status")
                .filter_eq("department")
                .filter("type", FilterRule::Equals("employmentType".into()))
                .filter_eq("location")
                .sort("title", SortKind::Text)
                .sort("createdAt", SortKind::Date)
                .sort("deadline", SortKind::Date)
                .default_sort("createdAt", Descending)
                .columns(["id", "title", "department", "location", "status"])
                .statuses(["active", "inactive", "closed"]),
            Self::Applications => base
                .search(["name", "email", "position"])
                .filter_eq("status")
                .filter("career", FilterRule::Equals("careerId".into()))
                .sort("name", SortKind::Text)
                .sort("createdAt", SortKind::Date)
                .default_sort("createdAt", Descending)
                .columns(["id", "name", "email", "position", "status"])
                .statuses(["pending", "reviewed", "shortlisted", "rejected", "hired"]),
            Self::Products => base
                .search(["name", "description", "category"])
                .filter_eq("status")
                .filter_eq("category")
                .sort("name", SortKind::Text)
                .sort("price", SortKind::Number)
                .sort("createdAt", SortKind::Date)
                .default_sort("name", Ascending)
                .columns(["id", "name", "category", "price", "status"])
                .statuses(ACTIVE_STATUSES),
            Self::Services => base
                .search(["title", "description"])
                .filter_eq("status")
                .sort("title", SortKind::Text)
                .sort("order", SortKind::Number)
                .sort("createdAt", SortKind::Date)
                .default_sort("order", Ascending)
                .columns(["id", "title", "order", "status"])
                .statuses(ACTIVE_STATUSES),
            Self::Projects => base
                .search(["title", "client", "category", "technologies"])
                .filter_eq("status")
                .filter_eq("category")
                .sort("title", SortKind::Text)
                .sort("createdAt", SortKind::Date)
                .sort("completedAt", SortKind::Date)
                .default_sort("createdAt", Descending)
                .columns(["id", "title", "client", "category", "status"])
                .statuses(PUBLISH_STATUSES),
            Self::Testimonials => base
                .search(["name", "company", "content"])
                .filter_eq("status")
                .filter_eq("rating")
                .sort("name", SortKind::Text)
                .sort("rating", SortKind::Number)
                .sort("createdAt", SortKind::Date)
                .default_sort("createdAt", Descending)
                .columns(["id", "name", "company", "rating", "status"])
                .statuses(["pending", "approved", "rejected"]),
            Self::Faqs => base
                .search(["question", "answer", "category"])
                .filter_eq("status")
                .filter_eq("category")
                .sort("question", SortKind::Text)
                .sort("order", SortKind::Number)
                .default_sort("order", Ascending)
                .columns(["id", "question", "category", "status"])
                .statuses(ACTIVE_STATUSES),
            Self::Teams => base
                .search(["name", "position", "email"])
                .filter_eq("status")
                .filter_eq("department")
                .sort("name", SortKind::Text)
                .sort("order", SortKind::Number)
                .default_sort("order", Ascending)
                .columns(["id", "name", "position", "department", "status"])
                .statuses(ACTIVE_STATUSES),
            Self::NewsletterSubscribers => base
                .search(["email", "name"])
                .filter_eq("status")
                .sort("email", SortKind::Text)
                .sort("subscribedAt", SortKind::Date)
                .sort("createdAt", SortKind::Date)
                .default_sort("createdAt", Descending)
                .columns(["id", "email", "name", "status"])
                .statuses(["active", "unsubscribed"]),
            Self::NewsletterCampaigns => base
                .search(["subject", "title"])
                .filter_eq("status")
                .sort("subject", SortKind::Text)
                .sort("scheduledAt", SortKind::Date)
                .sort("sentAt", SortKind::Date)
                .sort("createdAt", SortKind::Date)
                .default_sort("createdAt", Descending)
                .columns(["id", "subject", "status", "scheduledAt"])
                .statuses(["draft", "scheduled", "sent"]),
            Self::ContactRequests => base
                .search(["name", "email", "subject", "message"])
                .filter("status", FilterRule::OneOf("status".into()))
                .sort("name", SortKind::Text)
                .sort("createdAt", SortKind::Date)
                .default_sort("createdAt", Descending)
                .columns(["id", "name", "email", "subject", "status"])
                .statuses(REQUEST_STATUSES),
            Self::PartnershipRequests => base
                .search(["companyName", "contactName", "email"])
                .filter("status", FilterRule::OneOf("status".into()))
                .filter("type", FilterRule::Equals("partnershipType".into()))
                .sort("companyName", SortKind::Text)
                .sort("createdAt", SortKind::Date)
                .default_sort("createdAt", Descending)
                .columns(["id", "companyName", "contactName", "partnershipType", "status"])
                .statuses(REQUEST_STATUSES),
            Self::ProjectRequests => base
                .search(["name", "email", "company", "projectType"])
                .filter("status", FilterRule::OneOf("status".into()))
                .filter_eq("projectType")
                .filter_eq("budget")
                .sort("name", SortKind::Text)
                .sort("createdAt", SortKind::Date)
                .default_sort("createdAt", Descending)
                .columns(["id", "name", "company", "projectType", "status"])
                .statuses(REQUEST_STATUSES),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn names_round_trip_through_kebab_case() {
        assert_eq!(Entity::NewsletterSubscribers.to_string(), "newsletter-subscribers");
        assert_eq!(Entity::from_str("contact-requests").unwrap(), Entity::ContactRequests);
        assert!(Entity::from_str("widgets").is_err());
    }

    #[test]
    fn every_schema_is_usable() {
        for entity in Entity::iter() {
            let schema = entity.schema();
            assert!(schema.endpoint.starts_with('/'), "{entity}");
            assert!(!schema.searchable.is_empty(), "{entity}");
            assert!(schema.columns.first().is_some_and(|c| c == "id"), "{entity}");
            let (key, _) = schema.default_sort.as_ref().unwrap();
            assert!(schema.sort_keys.contains_key(key), "{entity}: {key}");
            assert!(!schema.statuses.is_empty(), "{entity}");
        }
    }

    #[test]
    fn request_status_filter_accepts_sets() {
        let schema = Entity::ContactRequests.schema();
        assert!(matches!(schema.filter_rule("status").as_ref(), FilterRule::OneOf(_)));
        assert!(schema.accepts_status("replied"));
        assert!(!schema.accepts_status("published"));
    }
}
