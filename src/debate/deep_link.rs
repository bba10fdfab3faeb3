use url::Url;

const SESSION_KEY: &str = "session";

fn session_pair(session_id: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair(SESSION_KEY, session_id)
        .finish()
}

/// Fragment that opens `session_id` read-only, e.g. `#session=abc`.
pub fn deep_link_fragment(session_id: &str) -> String {
    format!("#{}", session_pair(session_id))
}

/// Full share URL for `session_id` under `base`.
pub fn share_url(base: &Url, session_id: &str) -> Url {
    let mut url = base.clone();
    url.set_fragment(Some(&session_pair(session_id)));
    url
}

/// Extract the session id from a share link.
///
/// Accepts a full URL (`https://host/app#session=abc`), a bare fragment
/// (`#session=abc`) or the key/value pair alone (`session=abc`). Anything
/// without a non-empty `session` value yields `None`.
pub fn parse_deep_link(input: &str) -> Option<String> {
    let input = input.trim();
    let fragment = match Url::parse(input) {
        Ok(url) => url.fragment()?.to_string(),
        Err(_) => match input.split_once('#') {
            Some((_, fragment)) => fragment.to_string(),
            None => input.to_string(),
        },
    };

    url::form_urlencoded::parse(fragment.as_bytes())
        .find(|(key, _)| key == SESSION_KEY)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
