//! # ExoFOP portal client
//!
//! The narrow interface the upload phase talks through, and its HTTP
//! implementation. [`Portal`] keeps the core testable: plan execution only
//! needs login, one summary submission and one file upload.
//!
//! Uploads run strictly sequentially in plan order. The first failure aborts
//! the remaining operations; completed uploads are not rolled back, and retry
//! policy is the caller's business.

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::blocking::{multipart, Client};
use tracing::info;

use crate::errors::Sg1Error;
use crate::plan::{FileUploadForm, Operation, SummaryPayload, UploadItem, FILE_TYPE};

const EXOFOP_BASE: &str = "https://exofop.ipac.caltech.edu/tess";

/// What the upload phase needs from the portal.
pub trait Portal {
    fn login(&self, username: &str, password: &str) -> Result<(), Sg1Error>;

    fn submit_summary(&self, payload: &SummaryPayload) -> Result<(), Sg1Error>;

    fn upload_file(&self, path: &Utf8Path, form: &FileUploadForm) -> Result<(), Sg1Error>;
}

/// HTTP client for ExoFOP. Sessions are cookie-based, so one client instance
/// must be used for the whole run, login included.
pub struct ExoFop {
    client: Client,
    base: String,
}

impl ExoFop {
    pub fn new() -> Result<Self, Sg1Error> {
        Self::with_base(EXOFOP_BASE)
    }

    /// Client against a non-standard base URL (test servers).
    pub fn with_base(base: &str) -> Result<Self, Sg1Error> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(ExoFop {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, page: &str) -> String {
        format!("{}/{page}", self.base)
    }
}

impl Portal for ExoFop {
    fn login(&self, username: &str, password: &str) -> Result<(), Sg1Error> {
        let response = self
            .client
            .post(self.endpoint("password_check.php"))
            .form(&[
                ("username", username),
                ("password", password),
                ("ref", "login_user"),
                ("ref_page", "/tess/"),
            ])
            .send()?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(Sg1Error::LoginFailed(status.as_u16()));
        }
        info!("logged in to ExoFOP as {username}");
        Ok(())
    }

    fn submit_summary(&self, payload: &SummaryPayload) -> Result<(), Sg1Error> {
        let response = self
            .client
            .post(self.endpoint("insert_tseries.php"))
            .form(payload)
            .send()?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(Sg1Error::SummaryUploadFailed {
                filter: payload.filter.clone(),
                status: status.as_u16(),
            });
        }
        info!(filter = %payload.filter, "time series summary submitted");
        Ok(())
    }

    fn upload_file(&self, path: &Utf8Path, form: &FileUploadForm) -> Result<(), Sg1Error> {
        let multipart = multipart::Form::new()
            .file("file_name", path)?
            .text("file_type", FILE_TYPE)
            .text("planet", form.planet.clone())
            .text("file_desc", form.file_desc.clone())
            .text("file_tag", form.file_tag.clone())
            .text("groupname", form.groupname.clone())
            .text("propflag", form.propflag.clone())
            .text("tid", form.tid.clone());
        let response = self
            .client
            .post(self.endpoint("insert_file.php"))
            .multipart(multipart)
            .send()?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(Sg1Error::FileUploadFailed {
                file: path.file_name().unwrap_or(path.as_str()).to_string(),
                status: status.as_u16(),
            });
        }
        info!(file = %path, "file uploaded");
        Ok(())
    }
}

/// Run the planned operations in order against the portal.
///
/// One operation at a time, aborting on the first error.
pub fn execute_plan(
    portal: &impl Portal,
    directory: &Utf8Path,
    items: &[UploadItem],
) -> Result<(), Sg1Error> {
    for item in items {
        match &item.operation {
            Operation::Summary { filter, payload } => {
                info!(order = item.order, filter = %filter, "submitting summary");
                portal.submit_summary(payload)?;
            }
            Operation::File { name, form, .. } => {
                info!(order = item.order, file = %name, "uploading file");
                let path: Utf8PathBuf = directory.join(name);
                portal.upload_file(&path, form)?;
            }
        }
    }
    Ok(())
}
