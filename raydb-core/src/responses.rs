//! Canned answers for keywords that do not name a place,
//! e.g. the phone number of the management office.

use crate::{entities::Role, text::has_keyword};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredefinedResponse {
    pub name: String,
    /// Normalized, a trailing `*` matches by prefix.
    pub keywords: Vec<String>,
    /// Only users with this role get the answer.
    pub role: Option<Role>,
    pub message: Option<String>,
    /// File name inside the photo directory.
    pub photo: Option<String>,
}

impl PredefinedResponse {
    pub fn text(&self) -> String {
        match &self.message {
            Some(message) => format!("{}\n\n{}", self.name, message),
            None => self.name.clone(),
        }
    }
}

/// The first response whose keywords match the first token
/// and whose role the user has.
pub fn find_response<'a, T: AsRef<str>>(
    responses: &'a [PredefinedResponse],
    tokens: &[T],
    roles: &[Role],
) -> Option<&'a PredefinedResponse> {
    responses.iter().find(|r| {
        has_keyword(tokens, r.keywords.as_slice(), None) && r.role.map_or(true, |role| roles.contains(&role))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responses() -> Vec<PredefinedResponse> {
        vec![
            PredefinedResponse {
                name: "Moderator hints".into(),
                keywords: vec!["help".into()],
                role: Some(Role::Moderator),
                message: Some("Use /queue".into()),
                photo: None,
            },
            PredefinedResponse {
                name: "Management office".into(),
                keywords: vec!["office".into(), "manag*".into(), "help".into()],
                role: None,
                message: None,
                photo: Some("office.jpg".into()),
            },
        ]
    }

    #[test]
    fn match_first_token_by_keyword_or_prefix() {
        let responses = responses();
        let found = find_response(&responses, &["management", "phone"], &[]).unwrap();
        assert_eq!("Management office", found.name);
        assert!(find_response(&responses, &["phone", "office"], &[]).is_none());
        assert!(find_response::<&str>(&responses, &[], &[]).is_none());
    }

    #[test]
    fn skip_responses_for_other_roles() {
        let responses = responses();
        let found = find_response(&responses, &["help"], &[]).unwrap();
        assert_eq!("Management office", found.name);
        let found = find_response(&responses, &["help"], &[Role::Moderator]).unwrap();
        assert_eq!("Moderator hints\n\nUse /queue", found.text());
    }
}
