use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::account::errors::AccountIdError;
use crate::account::errors::EmailError;
use crate::account::errors::RoleError;

/// Account aggregate entity.
///
/// One record per registered account: credentials, uploaded documents,
/// activity stamp, and status flags.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub email: EmailAddress,
    pub password_hash: String,
    /// Append-only, in upload order. Duplicate names are legal.
    pub documents: Vec<Document>,
    /// Set only on successful login. `None` means never logged in.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Monotonic: only ever transitions false -> true.
    pub is_premium: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Account unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// Generate a new random account ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an account ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, AccountIdError> {
        Uuid::parse_str(s)
            .map(AccountId)
            .map_err(|e| AccountIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using an RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Account role, validated at the boundary.
///
/// Unknown role strings are rejected instead of stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document uploaded against an account.
///
/// `storage_reference` is an opaque locator into the upload storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub storage_reference: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Command to register a new account with validated fields.
#[derive(Debug)]
pub struct RegisterAccountCommand {
    pub email: EmailAddress,
    pub password: String,
}

impl RegisterAccountCommand {
    pub fn new(email: EmailAddress, password: String) -> Self {
        Self { email, password }
    }
}

/// An uploaded file as it arrives from the HTTP boundary, before storage.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Multipart field name ("documents", "profileImage", "productImage").
    pub field_name: String,
    pub original_filename: String,
    pub bytes: Vec<u8>,
}

/// Upload category, derived from the multipart field name.
///
/// Only `Document` uploads are recorded on the account; image categories are
/// stored but carry no account metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCategory {
    Profile,
    Product,
    Document,
}

impl UploadCategory {
    pub fn from_field_name(field_name: &str) -> Self {
        match field_name {
            "profileImage" => UploadCategory::Profile,
            "productImage" => UploadCategory::Product,
            _ => UploadCategory::Document,
        }
    }

    /// Subdirectory of the storage root for this category.
    pub fn directory(&self) -> &'static str {
        match self {
            UploadCategory::Profile => "profiles",
            UploadCategory::Product => "products",
            UploadCategory::Document => "documents",
        }
    }
}
