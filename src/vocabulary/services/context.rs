//! Per-call tenant context.

use crate::error::{CustomizationError, CustomizationResult};
use crate::vocabulary::domain::{ConfigVersion, TenantId};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Tenant, optional version pin, cancellation signal and resolver deadline
/// of one engine call.
///
/// The tenant is mandatory; there is no ambient tenant anywhere in the
/// engine.
#[derive(Debug, Clone)]
pub struct TenantContext {
    tenant: TenantId,
    expected_version: Option<ConfigVersion>,
    cancellation: CancellationToken,
    deadline: Option<Duration>,
}

impl TenantContext {
    /// Creates an unpinned, never-cancelled context.
    #[must_use]
    pub fn new(tenant: TenantId) -> Self {
        Self {
            tenant,
            expected_version: None,
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Creates a context from a raw tenant identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CustomizationError::Domain`] when the identifier is blank
    /// or too long.
    pub fn for_tenant(tenant: &str) -> CustomizationResult<Self> {
        Ok(Self::new(TenantId::new(tenant)?))
    }

    /// Pins the call to `version`; the call fails with `VersionStale` when
    /// the committed version differs.
    #[must_use]
    pub const fn pinned(mut self, version: ConfigVersion) -> Self {
        self.expected_version = Some(version);
        self
    }

    /// Attaches a cancellation signal.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Bounds external reference resolution by `deadline`.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the tenant.
    #[must_use]
    pub const fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Returns the pinned version, if any.
    #[must_use]
    pub const fn expected_version(&self) -> Option<ConfigVersion> {
        self.expected_version
    }

    /// Returns the cancellation signal.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns the resolver deadline, if the caller supplied one.
    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Returns the same context without a version pin.
    #[must_use]
    pub fn unpinned(&self) -> Self {
        Self {
            expected_version: None,
            ..self.clone()
        }
    }

    /// Fails with [`CustomizationError::Cancelled`] once the signal fired.
    pub(crate) fn ensure_live(&self) -> CustomizationResult<()> {
        if self.cancellation.is_cancelled() {
            debug!(tenant = %self.tenant, "operation cancelled");
            return Err(CustomizationError::Cancelled);
        }
        Ok(())
    }

    /// Fails with `VersionStale` when pinned to a version other than
    /// `current`.
    pub(crate) fn ensure_version(&self, current: ConfigVersion) -> CustomizationResult<()> {
        if let Some(pinned) = self.expected_version
            && pinned != current
        {
            return Err(CustomizationError::PinnedVersionStale { pinned, current });
        }
        Ok(())
    }
}
