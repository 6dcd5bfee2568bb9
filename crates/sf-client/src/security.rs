//! Input checks for values that end up in SOQL text, URL paths or SOAP envelopes.
//!
//! Anything caller-supplied that is spliced into a request goes through one
//! of these helpers first:
//!
//! ```rust
//! use forcelink_sf_client::security::{soql, url};
//!
//! let name = soql::escape_string("O'Brien");
//! let query = format!("SELECT Id FROM Contact WHERE LastName = '{}'", name);
//!
//! assert!(soql::is_safe_sobject_name("Account"));
//! assert_eq!(url::encode_param("A/B"), "A%2FB");
//! ```

/// SOQL literal escaping and identifier validation.
pub mod soql {
    /// Escape a value for use inside a single-quoted SOQL string literal.
    ///
    /// Quotes, backslashes and the `\n`, `\r`, `\t` control characters are
    /// backslash-escaped.
    ///
    /// ```rust
    /// use forcelink_sf_client::security::soql;
    ///
    /// assert_eq!(soql::escape_string("O'Brien"), "O\\'Brien");
    /// ```
    #[must_use]
    pub fn escape_string(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 8);
        for ch in value.chars() {
            match ch {
                '\'' => escaped.push_str("\\'"),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// True for an API field name: an ASCII letter followed by letters,
    /// digits or underscores (`Name`, `ExtId__c`, `Owner__r`).
    #[must_use]
    pub fn is_safe_field_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            }
            _ => false,
        }
    }

    /// True for an sobject API name. Same rules as field names.
    #[must_use]
    pub fn is_safe_sobject_name(name: &str) -> bool {
        is_safe_field_name(name)
    }
}

/// URL path helpers.
pub mod url {
    /// Percent-encode a single path segment or query value.
    #[must_use]
    pub fn encode_param(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }

    /// True for a 15 or 18 character alphanumeric record id.
    #[must_use]
    pub fn is_valid_salesforce_id(id: &str) -> bool {
        matches!(id.len(), 15 | 18) && id.chars().all(|c| c.is_ascii_alphanumeric())
    }

    /// `sobjects/{type}/{id}`, or `None` if either part fails validation.
    ///
    /// ```rust
    /// use forcelink_sf_client::security::url;
    ///
    /// assert_eq!(
    ///     url::sobject_path("Account", "001000000000001AAA").as_deref(),
    ///     Some("sobjects/Account/001000000000001AAA")
    /// );
    /// assert_eq!(url::sobject_path("Account", "../limits"), None);
    /// ```
    #[must_use]
    pub fn sobject_path(sobject: &str, id: &str) -> Option<String> {
        if !super::soql::is_safe_sobject_name(sobject) || !is_valid_salesforce_id(id) {
            return None;
        }
        Some(format!("sobjects/{}/{}", sobject, id))
    }
}

/// XML escaping for SOAP request bodies.
pub mod xml {
    /// Escape the five predefined XML entities.
    #[must_use]
    pub fn escape(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 8);
        for ch in value.chars() {
            match ch {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }
}
