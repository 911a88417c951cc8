//! The claim flow: verify the caller, then hand out at most one prize per user.

use crate::audit::SpinLog;
use crate::auth::{InitDataValidator, VerifiedIdentity};
use crate::config::WheelConfig;
use crate::error::{Result, WheelError};
use crate::prize::{PrizeAssigner, PrizeCatalog};
use crate::storage::SpinLedger;
use crate::types::{ClaimOutcome, SpinStatus};
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

type BoxedRng = Box<dyn RngCore + Send>;

pub struct SpinService {
    validator: InitDataValidator,
    ledger: SpinLedger,
    catalog: PrizeCatalog,
    assigner: Mutex<PrizeAssigner<BoxedRng>>,
    admin_user_id: Option<i64>,
    spin_log: Option<SpinLog>,
}

impl SpinService {
    pub fn new(validator: InitDataValidator, ledger: SpinLedger, catalog: PrizeCatalog) -> Self {
        let rng: BoxedRng = Box::new(StdRng::from_entropy());
        Self {
            validator,
            ledger,
            assigner: Mutex::new(PrizeAssigner::new(catalog.clone(), rng)),
            catalog,
            admin_user_id: None,
            spin_log: None,
        }
    }

    /// Build the service from configuration, opening the ledger at `db_path`.
    pub async fn from_config(config: &WheelConfig) -> Result<Self> {
        config.validate()?;

        let validator = InitDataValidator::new(&config.bot_token)?;
        let ledger = SpinLedger::open(&config.db_path).await?;
        let mut service = Self::new(validator, ledger, config.catalog()?);

        if let Some(admin_user_id) = config.admin_user_id {
            service = service.with_admin(admin_user_id);
        }
        if let Some(log_dir) = &config.log_dir {
            service = service.with_spin_log(SpinLog::new(log_dir));
        }

        Ok(service)
    }

    /// Exempt `user_id` from the one-spin rule. Its spins are never stored.
    pub fn with_admin(mut self, user_id: i64) -> Self {
        self.admin_user_id = Some(user_id);
        self
    }

    /// Replace the random source, e.g. with a seeded one.
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        let rng: BoxedRng = Box::new(rng);
        self.assigner = Mutex::new(PrizeAssigner::new(self.catalog.clone(), rng));
        self
    }

    pub fn with_spin_log(mut self, spin_log: SpinLog) -> Self {
        self.spin_log = Some(spin_log);
        self
    }

    pub fn prizes(&self) -> &[String] {
        self.catalog.prizes()
    }

    pub fn ledger(&self) -> &SpinLedger {
        &self.ledger
    }

    pub fn validator(&self) -> &InitDataValidator {
        &self.validator
    }

    pub fn is_privileged(&self, user_id: i64) -> bool {
        self.admin_user_id == Some(user_id)
    }

    /// Verify `init_data` and spin the wheel for its user.
    pub async fn claim(&self, init_data: &str) -> Result<ClaimOutcome> {
        let identity = self.validator.validate(init_data)?;
        let outcome = self.claim_for(&identity).await?;

        if let Some(spin_log) = &self.spin_log {
            // The prize is already settled; a failed audit write must not undo it
            if let Err(e) = spin_log.record(identity.user(), &outcome) {
                tracing::warn!("Failed to write spin log {}: {}", spin_log.path().display(), e);
            }
        }

        Ok(outcome)
    }

    pub async fn claim_for(&self, identity: &VerifiedIdentity) -> Result<ClaimOutcome> {
        let user_id = identity.id();
        let privileged = self.is_privileged(user_id);

        let existing = self.ledger.get(user_id).await?;
        if let Some(record) = existing.filter(|_| !privileged) {
            tracing::debug!("User {} already spun: {}", user_id, record.prize);
            return Ok(ClaimOutcome::existing(record.prize));
        }

        let prize = self.draw();

        if privileged {
            tracing::info!("Privileged user {} spun {} (not recorded)", user_id, prize);
            return Ok(ClaimOutcome::preview(prize));
        }

        self.settle(user_id, prize).await
    }

    /// Verify `init_data` and report whether its user has spun.
    pub async fn status(&self, init_data: &str) -> Result<SpinStatus> {
        let identity = self.validator.validate(init_data)?;
        self.status_for(&identity).await
    }

    pub async fn status_for(&self, identity: &VerifiedIdentity) -> Result<SpinStatus> {
        Ok(self.ledger.get(identity.id()).await?.into())
    }

    pub fn close(self) -> Result<()> {
        self.ledger.close()
    }

    fn draw(&self) -> String {
        self.assigner.lock().assign().to_string()
    }

    // Persist `prize` unless someone else got there first, in which case
    // report what they stored instead.
    async fn settle(&self, user_id: i64, prize: String) -> Result<ClaimOutcome> {
        if self.ledger.reserve(user_id, &prize, Utc::now()).await? {
            tracing::info!("User {} won {}", user_id, prize);
            return Ok(ClaimOutcome::fresh(prize));
        }

        let stored = self.ledger.get(user_id).await?.ok_or_else(|| {
            WheelError::internal(format!(
                "Spin record for user {} missing after lost reservation",
                user_id
            ))
        })?;

        tracing::debug!(
            "User {} lost a concurrent claim; drew {} but keeps {}",
            user_id,
            prize,
            stored.prize
        );
        Ok(ClaimOutcome::existing(stored.prize))
    }
}

impl std::fmt::Debug for SpinService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinService")
            .field("prizes", &self.catalog.prizes())
            .field("admin_user_id", &self.admin_user_id)
            .field("spin_log", &self.spin_log)
            .finish_non_exhaustive()
    }
}
