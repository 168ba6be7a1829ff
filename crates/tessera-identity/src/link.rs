use url::form_urlencoded;
use url::Url;

use crate::did::is_valid_did;
use crate::error::IdentityError;

const VERIFY_HOST: &str = "verify";
const USER_DOC_PARAM: &str = "userDoc";
const NAME_PARAM: &str = "name";

/// Payload of a verify QR code: `<scheme>://verify/<did>?userDoc=<url>&name=<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyLink {
    pub did: String,
    pub user_doc_url: Option<String>,
    pub name: Option<String>,
}

impl VerifyLink {
    pub fn new(did: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            user_doc_url: None,
            name: None,
        }
    }

    pub fn with_user_doc(mut self, url: impl Into<String>) -> Self {
        self.user_doc_url = Some(url.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn to_url(&self, scheme: &str) -> String {
        let mut link = format!("{}://{}/{}", scheme, VERIFY_HOST, self.did);

        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(doc) = &self.user_doc_url {
            query.append_pair(USER_DOC_PARAM, doc);
        }
        if let Some(name) = &self.name {
            query.append_pair(NAME_PARAM, name);
        }
        let query = query.finish();
        if !query.is_empty() {
            link.push('?');
            link.push_str(&query);
        }
        link
    }

    pub fn parse(input: &str, scheme: &str) -> Result<Self, IdentityError> {
        let url = Url::parse(input.trim()).map_err(|e| IdentityError::InvalidLink(e.to_string()))?;

        if url.scheme() != scheme {
            return Err(IdentityError::InvalidLink(format!(
                "expected scheme {}, got {}",
                scheme,
                url.scheme()
            )));
        }
        if url.host_str() != Some(VERIFY_HOST) {
            return Err(IdentityError::InvalidLink(format!(
                "expected {}://{}/...",
                scheme, VERIFY_HOST
            )));
        }

        let did = url.path().trim_matches('/');
        if !is_valid_did(did) {
            return Err(IdentityError::InvalidLink(format!("not a valid DID: {}", did)));
        }

        let mut link = VerifyLink::new(did);
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                USER_DOC_PARAM => link.user_doc_url = Some(value.into_owned()),
                NAME_PARAM => link.name = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(link)
    }
}
