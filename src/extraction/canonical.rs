use regex::Regex;
use url::Url;

use crate::config::LinkRewrite;
use crate::error::Result;

/// Rewrites a raw href into the stable identity key of a product.
///
/// The volatile suffix is stripped first, then the result is resolved against
/// the base URL. Both steps are idempotent, so canonical links are fixed points.
#[derive(Debug, Clone, Default)]
pub struct LinkCanonicalizer {
    strip: Option<Regex>,
    base: Option<Url>,
}

impl LinkCanonicalizer {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn compile(rewrite: Option<&LinkRewrite>) -> Result<Self> {
        let Some(rewrite) = rewrite else {
            return Ok(Self::identity());
        };

        let strip = rewrite
            .strip_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()?;
        let base = rewrite.base_url.as_deref().map(Url::parse).transpose()?;

        Ok(Self { strip, base })
    }

    pub fn canonicalize(&self, raw_link: &str) -> String {
        let stripped = match &self.strip {
            Some(pattern) => pattern.replace_all(raw_link, "").into_owned(),
            None => raw_link.to_string(),
        };

        match &self.base {
            Some(base) => match base.join(&stripped) {
                Ok(absolute) => absolute.to_string(),
                Err(_) => stripped,
            },
            None => stripped,
        }
    }
}
