//! Sync tokens and share links.
//!
//! A token is `v1.<base64url(team name)>.<secret>`. Anyone holding it reads
//! and writes the team's snapshot. Share links carry the token, base64url
//! encoded once more, in the `sync` query parameter.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use url::Url;

use super::SyncError;
use crate::models::{EntityId, TeamId};

pub const TOKEN_VERSION: &str = "v1";

/// Query parameter carrying the token in a share link.
pub const SHARE_PARAM: &str = "sync";

/// Team identity decoded from a sync token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCredentials {
    pub team_name: String,
    pub team_secret: String,
}

/// A fresh random team secret, 32 lowercase hex characters.
pub fn generate_team_secret() -> String {
    hex::encode(uuid::Uuid::new_v4().as_bytes())
}

pub fn create_sync_token(team_name: &str, team_secret: &str) -> String {
    format!(
        "{}.{}.{}",
        TOKEN_VERSION,
        URL_SAFE_NO_PAD.encode(team_name.trim()),
        team_secret.trim()
    )
}

pub fn parse_sync_token(token: &str) -> Result<SyncCredentials, SyncError> {
    let invalid = |reason: &str| SyncError::InvalidToken(reason.to_string());

    let parts: Vec<&str> = token.trim().split('.').collect();
    let [version, team, secret] = parts.as_slice() else {
        return Err(invalid("expected three dot-separated parts"));
    };
    if *version != TOKEN_VERSION {
        return Err(invalid("unsupported token version"));
    }
    if team.is_empty() || secret.is_empty() {
        return Err(invalid("empty team or secret"));
    }

    let team_name = URL_SAFE_NO_PAD
        .decode(team)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| invalid("team name is not valid base64url"))?;
    let team_name = team_name.trim();
    if team_name.is_empty() {
        return Err(invalid("empty team name"));
    }

    Ok(SyncCredentials {
        team_name: team_name.to_string(),
        team_secret: secret.to_string(),
    })
}

/// Stable id of a team, used to key its local roster.
pub fn team_id(credentials: &SyncCredentials) -> TeamId {
    let name = credentials.team_name.trim().to_lowercase();
    EntityId::generate(&[name.as_str(), credentials.team_secret.as_str()])
}

/// `origin` with the token attached as `?sync=...`, replacing any previous one.
pub fn create_share_link(origin: &str, token: &str) -> Result<String, SyncError> {
    let mut url = Url::parse(origin)?;
    let kept = query_without_token(&url);

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        query.append_pair(SHARE_PARAM, &URL_SAFE_NO_PAD.encode(token.trim()));
    }
    Ok(url.to_string())
}

/// The token carried by a share link, if it has a readable one.
pub fn token_from_share_link(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    let encoded = url
        .query_pairs()
        .find(|(k, _)| k == SHARE_PARAM)
        .map(|(_, v)| v.into_owned())?;

    let bytes = URL_SAFE_NO_PAD.decode(encoded.as_bytes()).ok()?;
    let token = String::from_utf8(bytes).ok()?;
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Remove the token from a share link so it can be shown or bookmarked safely.
pub fn strip_share_token(link: &str) -> Result<String, SyncError> {
    let mut url = Url::parse(link.trim())?;
    let kept = query_without_token(&url);

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Ok(url.to_string())
}

/// Resolve user input that is either a raw token or a share link.
pub fn resolve_token_input(input: &str) -> Result<(String, SyncCredentials), SyncError> {
    let token = token_from_share_link(input).unwrap_or_else(|| input.trim().to_string());
    let credentials = parse_sync_token(&token)?;
    Ok((token, credentials))
}

fn query_without_token(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .filter(|(k, _)| k != SHARE_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
