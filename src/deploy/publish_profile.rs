//! Publishing profile parsing
//!
//! App Service returns publishing credentials as a small XML document with one
//! `<publishProfile>` element per publish method. Only the FTP entry is used.

use crate::error::{ProvisionError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use zeroize::Zeroizing;

/// FTP publishing credentials of a web app
#[derive(Clone)]
pub struct PublishProfile {
    pub profile_name: String,
    pub publish_url: String,
    pub user_name: String,
    pub password: Zeroizing<String>,
    pub passive_mode: bool,
}

impl fmt::Debug for PublishProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishProfile")
            .field("profile_name", &self.profile_name)
            .field("publish_url", &self.publish_url)
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .field("passive_mode", &self.passive_mode)
            .finish()
    }
}

impl PublishProfile {
    /// Extract the FTP profile from a `publishxml` response
    pub fn parse_ftp(xml: &str) -> Result<Self> {
        let element_re = Regex::new(r"<publishProfile\b([^>]*)/?>")?;
        let attribute_re = Regex::new(r#"([A-Za-z_][\w.-]*)\s*=\s*"([^"]*)""#)?;

        let mut seen_methods = Vec::new();
        for element in element_re.captures_iter(xml) {
            let attributes: HashMap<&str, String> = attribute_re
                .captures_iter(&element[1])
                .filter_map(|attr| {
                    let name = attr.get(1)?.as_str();
                    let value = attr.get(2)?.as_str();
                    Some((name, unescape_xml(value)))
                })
                .collect();

            let method = attributes.get("publishMethod").cloned().unwrap_or_default();
            if !method.eq_ignore_ascii_case("FTP") {
                seen_methods.push(method);
                continue;
            }

            let field = |name: &str| -> Result<String> {
                attributes
                    .get(name)
                    .filter(|value| !value.is_empty())
                    .cloned()
                    .ok_or_else(|| {
                        ProvisionError::invalid_publish_profile(format!(
                            "FTP profile is missing '{}'",
                            name
                        ))
                    })
            };

            return Ok(Self {
                profile_name: attributes.get("profileName").cloned().unwrap_or_default(),
                publish_url: field("publishUrl")?,
                user_name: field("userName")?,
                password: Zeroizing::new(field("userPWD")?),
                passive_mode: attributes
                    .get("ftpPassiveMode")
                    .map(|value| !value.eq_ignore_ascii_case("false"))
                    .unwrap_or(true),
            });
        }

        Err(ProvisionError::invalid_publish_profile(format!(
            "no FTP profile found (available: [{}])",
            seen_methods.join(", ")
        )))
    }
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
