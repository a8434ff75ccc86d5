//! # Identity & Tenancy Context
//!
//! Every authenticated call carries a [`Caller`]: who they are, which
//! [`Role`] they hold and which pharmacy is home. Authorization is a pure
//! decision over that triple and the [`Operation`] being attempted.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Caller {role, user_id, pharmacy_id}  +  Operation                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CAPABILITIES table: is role allowed for operation?                    │
//! │       │                                                                 │
//! │       ├── no  → Unauthorized                                           │
//! │       │                                                                 │
//! │       ├── Admin → Scope::AllPharmacies  (filter omitted → None)        │
//! │       │                                                                 │
//! │       └── Owner / Pharmacist → Scope::Pharmacy(home)                   │
//! │                │                                                        │
//! │                ▼                                                        │
//! │        scope.ensure(row.pharmacy_id) on every touched row              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

// =============================================================================
// Role
// =============================================================================

/// The three roles, from widest to narrowest administrative reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Cross-tenant administrator.
    Admin,
    /// Runs one pharmacy: catalog and staff.
    Owner,
    /// Works at one pharmacy: cart and sales.
    Pharmacist,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Owner => "owner",
            Role::Pharmacist => "pharmacist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            "pharmacist" => Ok(Role::Pharmacist),
            _ => Err(ValidationError::InvalidFormat {
                field: "role".to_string(),
                reason: "must be one of admin, owner, pharmacist".to_string(),
            }),
        }
    }
}

// =============================================================================
// Caller
// =============================================================================

/// The authenticated principal behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
    /// Home pharmacy. Absent for admins.
    pub pharmacy_id: Option<String>,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role, pharmacy_id: Option<String>) -> Self {
        Caller {
            user_id: user_id.into(),
            role,
            pharmacy_id,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Operations & Capability Table
// =============================================================================

/// Every gated operation in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    // Catalog
    CreateMedicine,
    UpdateMedicine,
    DeleteMedicine,
    CreateVariant,
    UpdateVariant,
    DeleteVariant,
    ViewCatalog,
    SearchCatalog,
    // Cart & sales
    ManageCart,
    ConfirmSale,
    ViewSales,
    ViewReceipt,
    // Orders
    ViewOrders,
    // Pharmacies
    CreatePharmacy,
    UpdatePharmacy,
    DeletePharmacy,
    ViewPharmacies,
    // Users
    CreateOwner,
    CreatePharmacist,
    ListPharmacists,
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const ADMIN_OWNER: &[Role] = &[Role::Admin, Role::Owner];
const STAFF: &[Role] = &[Role::Owner, Role::Pharmacist];
const EVERYONE: &[Role] = &[Role::Admin, Role::Owner, Role::Pharmacist];

/// Roles admitted to an operation.
///
/// Admin never appears next to cart or sale capture: those are in-store
/// actions tied to a home pharmacy.
pub const fn allowed_roles(op: Operation) -> &'static [Role] {
    use Operation::*;
    match op {
        CreateMedicine | UpdateMedicine | CreateVariant | UpdateVariant => ADMIN_OWNER,
        DeleteMedicine | DeleteVariant | CreatePharmacy | DeletePharmacy | CreateOwner => {
            ADMIN_ONLY
        }
        ViewCatalog | ViewSales | ViewReceipt | ViewOrders | ViewPharmacies => EVERYONE,
        SearchCatalog | ManageCart | ConfirmSale => STAFF,
        UpdatePharmacy | CreatePharmacist | ListPharmacists => ADMIN_OWNER,
    }
}

// =============================================================================
// Scope
// =============================================================================

/// Tenancy reach granted by a successful authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Admin: no pharmacy filter.
    AllPharmacies,
    /// Confined to one pharmacy.
    Pharmacy(String),
}

impl Scope {
    /// The filter to hand to repositories (`None` = all pharmacies).
    pub fn pharmacy_filter(&self) -> Option<&str> {
        match self {
            Scope::AllPharmacies => None,
            Scope::Pharmacy(id) => Some(id.as_str()),
        }
    }

    pub fn admits(&self, pharmacy_id: &str) -> bool {
        match self {
            Scope::AllPharmacies => true,
            Scope::Pharmacy(id) => id == pharmacy_id,
        }
    }

    /// Fails with `Unauthorized` if the row belongs to another pharmacy.
    pub fn ensure(&self, pharmacy_id: &str) -> CoreResult<()> {
        if self.admits(pharmacy_id) {
            Ok(())
        } else {
            Err(CoreError::unauthorized(
                "resource belongs to another pharmacy",
            ))
        }
    }

    /// The confined pharmacy, for operations that need a concrete tenant.
    pub fn home_pharmacy(&self) -> CoreResult<&str> {
        match self {
            Scope::Pharmacy(id) => Ok(id.as_str()),
            Scope::AllPharmacies => Err(CoreError::unauthorized(
                "operation requires a pharmacy-bound caller",
            )),
        }
    }
}

/// Authorizes `caller` for `op` and returns the tenancy scope to apply.
///
/// ## Example
/// ```rust
/// use pharma_core::access::{authorize, Caller, Operation, Role, Scope};
///
/// let admin = Caller::new("a", Role::Admin, None);
/// assert_eq!(authorize(&admin, Operation::ViewSales).unwrap(), Scope::AllPharmacies);
/// assert!(authorize(&admin, Operation::ManageCart).is_err());
/// ```
pub fn authorize(caller: &Caller, op: Operation) -> CoreResult<Scope> {
    if !allowed_roles(op).contains(&caller.role) {
        tracing::debug!(
            user_id = %caller.user_id,
            role = %caller.role,
            operation = ?op,
            "Operation denied by capability table"
        );
        return Err(CoreError::unauthorized(format!(
            "role {} may not perform {:?}",
            caller.role, op
        )));
    }

    if caller.is_admin() {
        return Ok(Scope::AllPharmacies);
    }

    match caller.pharmacy_id.as_deref() {
        Some(id) if !id.is_empty() => Ok(Scope::Pharmacy(id.to_string())),
        _ => Err(CoreError::unauthorized("caller has no pharmacy")),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
