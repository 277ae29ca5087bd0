use std::sync::Arc;

use log::debug;

use super::{FulcrumClient, RemoteError, TOKEN_HEADER};
use crate::records::{FORM_ID, ResultPage};

/// Page size requested from the service; one record per LED.
const PER_PAGE: &str = "64";

/// Fetches the newest page of records for the dashboard.
pub trait PagePoller {
    fn poll(&self) -> Result<ResultPage, RemoteError>;
}

impl<T: PagePoller + ?Sized> PagePoller for Arc<T> {
    fn poll(&self) -> Result<ResultPage, RemoteError> {
        (**self).poll()
    }
}

fn poll_query() -> [(&'static str, &'static str); 4] {
    [
        ("newest_first", "true"),
        ("page", "1"),
        ("per_page", PER_PAGE),
        ("form_id", FORM_ID),
    ]
}

impl PagePoller for FulcrumClient {
    fn poll(&self) -> Result<ResultPage, RemoteError> {
        let token = self.credentials.token()?;
        let response = self
            .http
            .get(&self.config.records_url)
            .header(TOKEN_HEADER, token)
            .query(&poll_query())
            .timeout(self.config.poll_timeout)
            .send()?;

        let status = response.status();
        debug!("Fetch recent records: {}", status);
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RemoteError::Status { status, body });
        }

        Ok(response.json()?)
    }
}
