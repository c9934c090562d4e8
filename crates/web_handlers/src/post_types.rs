use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use auth_services::types::Claims;

use crate::error::ApiError;
use crate::fields;

/// Post row
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Unique identifier for the post
    pub id: i64,
    /// Author email, the ownership key
    pub author_email: String,
    /// Author display name
    pub author_name: String,
    /// Author image URL
    pub author_image_url: Option<String>,
    /// Place the post is about
    pub place: String,
    /// Free-form location
    pub location: Option<String>,
    /// Section of the public site
    pub section_id: Option<String>,
    /// Body text
    pub description: String,
    /// Latitude
    pub lat: Option<f64>,
    /// Longitude
    pub lng: Option<f64>,
    /// Moderation flag
    pub approved: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Media row tagged with its post
#[derive(Debug, sqlx::FromRow)]
pub struct MediaRow {
    /// Owning post
    pub post_id: i64,
    /// Media URL
    pub media_url: String,
}

/// Tag row tagged with its post
#[derive(Debug, sqlx::FromRow)]
pub struct TagRow {
    /// Owning post
    pub post_id: i64,
    /// Tag name
    pub tag_name: String,
}

/// Post with its ordered media and tags
#[derive(Debug, Serialize)]
pub struct PostWithMedia {
    /// Post fields
    #[serde(flatten)]
    pub post: Post,
    /// Media URLs in display order
    pub media: Vec<String>,
    /// Tag names
    pub tags: Vec<String>,
}

/// Request structure for submitting a post
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    /// Place the post is about
    pub place: Option<String>,
    /// Free-form location
    pub location: Option<String>,
    /// Section of the public site
    #[serde(alias = "sectionId")]
    pub section: Option<String>,
    /// Body text
    pub description: Option<String>,
    /// Latitude
    pub lat: Option<Value>,
    /// Longitude
    pub lng: Option<Value>,
    /// Author image URL
    #[serde(alias = "authorImageUrl")]
    pub author_image: Option<String>,
    /// Media URLs in display order
    #[serde(default)]
    pub media: Vec<String>,
    /// Tag names
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Validated post submission
#[derive(Debug, PartialEq)]
pub struct NewPost {
    /// Place the post is about
    pub place: String,
    /// Free-form location
    pub location: Option<String>,
    /// Section of the public site
    pub section: Option<String>,
    /// Body text
    pub description: String,
    /// Latitude
    pub lat: Option<f64>,
    /// Longitude
    pub lng: Option<f64>,
    /// Author image URL
    pub author_image: Option<String>,
    /// Media URLs, blanks dropped
    pub media: Vec<String>,
    /// Distinct tag names in first-seen order
    pub tags: Vec<String>,
}

impl CreatePostRequest {
    /// Validates and normalizes the submission.
    pub fn parse(&self) -> Result<NewPost, ApiError> {
        let place = fields::non_empty(self.place.as_deref())
            .ok_or_else(|| ApiError::invalid("Place is required"))?;

        let mut tags: Vec<String> = Vec::new();
        for tag in &self.tags {
            if let Some(tag) = fields::non_empty(Some(tag.as_str())) {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }

        Ok(NewPost {
            place,
            location: fields::non_empty(self.location.as_deref()),
            section: fields::non_empty(self.section.as_deref()),
            description: self.description.as_deref().unwrap_or_default().trim().to_string(),
            lat: fields::optional_float("lat", self.lat.as_ref())?,
            lng: fields::optional_float("lng", self.lng.as_ref())?,
            author_image: fields::non_empty(self.author_image.as_deref()),
            media: self
                .media
                .iter()
                .filter_map(|url| fields::non_empty(Some(url.as_str())))
                .collect(),
            tags,
        })
    }
}

/// Query parameters for listing posts
#[derive(Debug, Default, Deserialize)]
pub struct PostQuery {
    /// Section filter
    pub section: Option<String>,
    /// Tag filter
    pub tag: Option<String>,
    /// Moderation filter; honoured for admins only
    pub approved: Option<String>,
}

/// Parsed post filters
#[derive(Debug, Default, PartialEq)]
pub struct PostFilter {
    /// Section filter
    pub section: Option<String>,
    /// Tag filter
    pub tag: Option<String>,
    /// Moderation filter
    pub approved: Option<bool>,
}

impl PostQuery {
    /// Parses the query string filters.
    pub fn parse(&self) -> Result<PostFilter, ApiError> {
        let approved = match self.approved.as_deref().map(str::trim) {
            None | Some("") => None,
            Some("true") | Some("1") => Some(true),
            Some("false") | Some("0") => Some(false),
            Some(_) => return Err(ApiError::invalid("approved must be true or false")),
        };

        Ok(PostFilter {
            section: fields::non_empty(self.section.as_deref()),
            tag: fields::non_empty(self.tag.as_deref()),
            approved,
        })
    }
}

/// Which posts a caller may see
#[derive(Debug, Clone, PartialEq)]
pub enum Viewer {
    /// No valid token: approved posts only
    Anonymous,
    /// Traveler: approved posts plus their own
    Member(String),
    /// Admin: everything
    Admin,
}

impl Viewer {
    /// Derives the viewer from optional token claims.
    pub fn from_claims(claims: Option<&Claims>) -> Self {
        match claims {
            None => Viewer::Anonymous,
            Some(claims) if claims.is_admin => Viewer::Admin,
            Some(claims) => Viewer::Member(claims.email.clone()),
        }
    }

    /// Whether this viewer may see `post`.
    pub fn can_see(&self, post: &Post) -> bool {
        match self {
            Viewer::Admin => true,
            Viewer::Member(email) => post.approved || post.author_email.eq_ignore_ascii_case(email),
            Viewer::Anonymous => post.approved,
        }
    }
}

/// Request structure for moderating a post
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    /// New moderation state; defaults to approved
    #[serde(default = "approve_by_default")]
    pub approved: bool,
}

fn approve_by_default() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(author: &str, approved: bool) -> Post {
        Post {
            id: 1,
            author_email: author.to_string(),
            author_name: "Author".to_string(),
            author_image_url: None,
            place: "Janakpur".to_string(),
            location: None,
            section_id: None,
            description: String::new(),
            lat: None,
            lng: None,
            approved,
            created_at: Utc::now(),
        }
    }

    fn claims(email: &str, is_admin: bool) -> Claims {
        Claims {
            id: 1,
            email: email.to_string(),
            name: "Caller".to_string(),
            is_admin,
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn test_parse_post() {
        let request: CreatePostRequest = serde_json::from_value(json!({
            "place": " Janakpur ",
            "sectionId": "nepal",
            "lat": "26.7288",
            "media": ["https://cdn/1.jpg", "", "https://cdn/2.jpg"],
            "tags": ["temple", " temple ", "", "aarti"]
        }))
        .unwrap();

        let parsed = request.parse().unwrap();
        assert_eq!(parsed.place, "Janakpur");
        assert_eq!(parsed.section.as_deref(), Some("nepal"));
        assert_eq!(parsed.lat, Some(26.7288));
        assert_eq!(parsed.media.len(), 2);
        assert_eq!(parsed.tags, vec!["temple", "aarti"]);
        assert_eq!(parsed.description, "");
    }

    #[test]
    fn test_place_required() {
        let request: CreatePostRequest =
            serde_json::from_value(json!({"description": "Evening aarti"})).unwrap();
        assert!(matches!(
            request.parse(),
            Err(ApiError::Validation(msg)) if msg == "Place is required"
        ));
    }

    #[test]
    fn test_visibility() {
        let mine = post("alice@x.com", false);
        let approved = post("bob@x.com", true);
        let pending = post("bob@x.com", false);

        let anonymous = Viewer::from_claims(None);
        assert!(anonymous.can_see(&approved));
        assert!(!anonymous.can_see(&pending));

        let alice = Viewer::from_claims(Some(&claims("Alice@X.com", false)));
        assert!(alice.can_see(&mine));
        assert!(alice.can_see(&approved));
        assert!(!alice.can_see(&pending));

        let admin = Viewer::from_claims(Some(&claims("admin@x.com", true)));
        assert_eq!(admin, Viewer::Admin);
        assert!(admin.can_see(&pending));
    }

    #[test]
    fn test_query_approved_filter() {
        let query = PostQuery {
            approved: Some("false".to_string()),
            ..Default::default()
        };
        assert_eq!(query.parse().unwrap().approved, Some(false));

        let bad = PostQuery {
            approved: Some("maybe".to_string()),
            ..Default::default()
        };
        assert!(bad.parse().is_err());
    }

    #[test]
    fn test_approve_defaults_to_true() {
        let request: ApproveRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.approved);
    }
}
