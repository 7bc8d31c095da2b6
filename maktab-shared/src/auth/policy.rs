//! Authorization policy
//!
//! Two roles exist. Super admins can do everything. Slot admins are
//! confined to the slot recorded on their account: they can see
//! registrations and record attendance for that slot only, and cannot
//! touch slots, admin accounts, settings, or reports.

use uuid::Uuid;

use crate::auth::middleware::AuthContext;
use crate::models::admin::AdminRole;

/// Error type for authorization decisions
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Operation requires the super admin role
    #[error("Super admin role required")]
    SuperAdminRequired,

    /// Slot admin tried to act outside their assigned slot
    #[error("Not authorized for slot {0}")]
    SlotNotAssigned(Uuid),
}

/// Row visibility for list queries, derived from the acting admin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotFilter {
    /// No restriction (super admin)
    All,

    /// Only the named slot (slot admin)
    Only(Uuid),

    /// No rows at all (slot admin with no slot on their account)
    Nothing,
}

/// The acting admin, as far as authorization is concerned
#[derive(Debug, Clone)]
pub struct Principal {
    /// Admin account ID
    pub admin_id: Uuid,

    /// Admin role
    pub role: AdminRole,

    /// Assigned slot for slot admins
    pub assigned_slot_id: Option<Uuid>,
}

impl Principal {
    /// Whether this principal is a super admin
    pub fn is_super_admin(&self) -> bool {
        self.role == AdminRole::SuperAdmin
    }

    /// Requires the super admin role
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::SuperAdminRequired` for slot admins
    pub fn require_super_admin(&self) -> Result<(), PolicyError> {
        if self.is_super_admin() {
            Ok(())
        } else {
            Err(PolicyError::SuperAdminRequired)
        }
    }

    /// Requires access to the given slot
    ///
    /// Super admins can access every slot; slot admins only the one on
    /// their account.
    pub fn require_slot_access(&self, slot_id: Uuid) -> Result<(), PolicyError> {
        if self.is_super_admin() {
            return Ok(());
        }

        match self.assigned_slot_id {
            Some(assigned) if assigned == slot_id => Ok(()),
            _ => Err(PolicyError::SlotNotAssigned(slot_id)),
        }
    }

    /// The slot filter to apply to list queries
    ///
    /// A slot admin whose account carries no slot sees nothing, mirroring
    /// [`Principal::require_slot_access`]: a missing assignment never
    /// widens access.
    pub fn slot_filter(&self) -> SlotFilter {
        if self.is_super_admin() {
            return SlotFilter::All;
        }

        match self.assigned_slot_id {
            Some(slot_id) => SlotFilter::Only(slot_id),
            None => SlotFilter::Nothing,
        }
    }
}

impl From<AuthContext> for Principal {
    fn from(context: AuthContext) -> Self {
        Self {
            admin_id: context.admin_id,
            role: context.role,
            assigned_slot_id: context.assigned_slot_id,
        }
    }
}
