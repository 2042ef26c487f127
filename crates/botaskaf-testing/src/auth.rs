//! Identity headers as the session gateway would inject them.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use botaskaf_auth_types::identity::USER_ID_HEADER;
use botaskaf_domain::id::UserId;

pub struct MockAuth {
    pub user_id: UserId,
}

impl MockAuth {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn header_name(&self) -> HeaderName {
        HeaderName::from_static(USER_ID_HEADER)
    }

    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from(self.user_id.0)
    }

    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(self.header_name(), self.header_value());
        map
    }
}
