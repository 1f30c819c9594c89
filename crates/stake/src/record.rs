//! The stake record and its two state machines.
//!
//! A stake has a lifecycle status (`pending → active → completed`, with `cancelled` reachable
//! from either of the first two) and an independent htlc sub-state that tracks its bitcoin
//! collateral (`waiting → locked → unlocked | expired`). Records are only ever updated through
//! the transition methods on [`StakeRecord`].
//!
//! The RPC handlers drive only locking and completion. Activation, cancellation and the htlc
//! outcomes are recorded by the watchers of the token network and the chain.

use std::{fmt, str::FromStr};

use bitcoin::{hashes::sha256, Txid};
use chrono::{DateTime, Days, Utc};
use ethnum::U256;
use gbpl_custody_params::types::AddressKind;
use serde::{Deserialize, Serialize};

use crate::errors::StakeError;

/// Lock-up period offered for a stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StakePeriod {
    /// Three months.
    #[serde(rename = "3m")]
    ThreeMonths,

    /// Six months.
    #[serde(rename = "6m")]
    SixMonths,
}

impl StakePeriod {
    /// Length of the period in days.
    pub const fn days(&self) -> u64 {
        match self {
            StakePeriod::ThreeMonths => 90,
            StakePeriod::SixMonths => 180,
        }
    }
}

impl fmt::Display for StakePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StakePeriod::ThreeMonths => f.write_str("3m"),
            StakePeriod::SixMonths => f.write_str("6m"),
        }
    }
}

impl FromStr for StakePeriod {
    type Err = StakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3m" => Ok(Self::ThreeMonths),
            "6m" => Ok(Self::SixMonths),
            _ => Err(StakeError::UnknownPeriod(s.to_string())),
        }
    }
}

/// Lifecycle status of a stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakeStatus {
    /// Created but not yet active.
    Pending,

    /// Earning yield.
    Active,

    /// Redeemed; tokens went back to the user.
    Completed,

    /// Abandoned before redemption.
    Cancelled,
}

impl StakeStatus {
    /// Whether a stake in this status may move to `next`.
    pub const fn can_transition_to(&self, next: StakeStatus) -> bool {
        matches!(
            (self, next),
            (StakeStatus::Pending, StakeStatus::Active)
                | (
                    StakeStatus::Pending | StakeStatus::Active,
                    StakeStatus::Completed | StakeStatus::Cancelled
                )
        )
    }

    /// Whether the stake can still be redeemed.
    pub const fn is_redeemable(&self) -> bool {
        matches!(self, StakeStatus::Pending | StakeStatus::Active)
    }
}

impl fmt::Display for StakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            StakeStatus::Pending => "pending",
            StakeStatus::Active => "active",
            StakeStatus::Completed => "completed",
            StakeStatus::Cancelled => "cancelled",
        };

        f.write_str(status)
    }
}

/// Status of the bitcoin collateral backing a stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HtlcStatus {
    /// No final-lock transaction has been broadcast yet.
    Waiting,

    /// The final-lock transaction has been broadcast.
    Locked,

    /// The collateral was spent through the preimage branch.
    Unlocked,

    /// The collateral was reclaimed through the timelock branch.
    Expired,
}

impl HtlcStatus {
    /// Whether the htlc may move to `next`.
    pub const fn can_transition_to(&self, next: HtlcStatus) -> bool {
        matches!(
            (self, next),
            (HtlcStatus::Waiting, HtlcStatus::Locked)
                | (HtlcStatus::Locked, HtlcStatus::Unlocked | HtlcStatus::Expired)
        )
    }
}

impl fmt::Display for HtlcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            HtlcStatus::Waiting => "waiting",
            HtlcStatus::Locked => "locked",
            HtlcStatus::Unlocked => "unlocked",
            HtlcStatus::Expired => "expired",
        };

        f.write_str(status)
    }
}

/// A stake, addressed by the network-2 signature of the transfer that created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeRecord {
    id: String,
    user_address: String,
    #[serde(with = "decimal")]
    gbpl_amount_raw: U256,
    stake_period: StakePeriod,
    status: StakeStatus,
    created_at: DateTime<Utc>,
    maturity_date: DateTime<Utc>,
    htlc_hash: sha256::Hash,
    htlc_status: HtlcStatus,
    deposit_address_kind: AddressKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    final_lock_txid: Option<Txid>,
}

impl StakeRecord {
    /// Creates a new active stake whose collateral has not been locked yet.
    pub fn new(
        id: String,
        user_address: String,
        gbpl_amount_raw: U256,
        stake_period: StakePeriod,
        created_at: DateTime<Utc>,
        htlc_hash: sha256::Hash,
        deposit_address_kind: AddressKind,
    ) -> Self {
        let maturity_date = created_at
            .checked_add_days(Days::new(stake_period.days()))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            id,
            user_address,
            gbpl_amount_raw,
            stake_period,
            status: StakeStatus::Active,
            created_at,
            maturity_date,
            htlc_hash,
            htlc_status: HtlcStatus::Waiting,
            deposit_address_kind,
            final_lock_txid: None,
        }
    }

    /// The originating network-2 signature.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The network-2 address that owns the stake.
    pub fn user_address(&self) -> &str {
        &self.user_address
    }

    /// The staked amount in base units.
    pub const fn gbpl_amount_raw(&self) -> U256 {
        self.gbpl_amount_raw
    }

    /// The lock-up period.
    pub const fn stake_period(&self) -> StakePeriod {
        self.stake_period
    }

    /// The lifecycle status.
    pub const fn status(&self) -> StakeStatus {
        self.status
    }

    /// When the stake was created.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the lock-up period ends.
    pub const fn maturity_date(&self) -> DateTime<Utc> {
        self.maturity_date
    }

    /// The hash the final-lock script commits to.
    pub const fn htlc_hash(&self) -> sha256::Hash {
        self.htlc_hash
    }

    /// The status of the bitcoin collateral.
    pub const fn htlc_status(&self) -> HtlcStatus {
        self.htlc_status
    }

    /// The output type the deposit address of this stake uses.
    pub const fn deposit_address_kind(&self) -> AddressKind {
        self.deposit_address_kind
    }

    /// The final-lock transaction, once broadcast.
    pub const fn final_lock_txid(&self) -> Option<Txid> {
        self.final_lock_txid
    }

    /// Whether the stake still waits for its collateral to be locked.
    pub const fn awaits_lock(&self) -> bool {
        self.status.is_redeemable() && matches!(self.htlc_status, HtlcStatus::Waiting)
    }

    /// Moves a pending stake to active.
    pub fn activate(&mut self) -> Result<(), StakeError> {
        self.transition(StakeStatus::Active)
    }

    /// Marks the stake as redeemed.
    pub fn complete(&mut self) -> Result<(), StakeError> {
        if !self.status.is_redeemable() {
            return Err(StakeError::NotRedeemable(self.status));
        }

        self.transition(StakeStatus::Completed)
    }

    /// Cancels the stake.
    pub fn cancel(&mut self) -> Result<(), StakeError> {
        self.transition(StakeStatus::Cancelled)
    }

    /// Records the broadcast of the final-lock transaction.
    pub fn mark_locked(&mut self, final_lock_txid: Txid) -> Result<(), StakeError> {
        self.htlc_transition(HtlcStatus::Locked)?;
        self.final_lock_txid = Some(final_lock_txid);

        Ok(())
    }

    /// Records that the collateral was released with the preimage.
    pub fn mark_unlocked(&mut self) -> Result<(), StakeError> {
        self.htlc_transition(HtlcStatus::Unlocked)
    }

    /// Records that the collateral timelock ran out.
    pub fn mark_expired(&mut self) -> Result<(), StakeError> {
        self.htlc_transition(HtlcStatus::Expired)
    }

    fn transition(&mut self, to: StakeStatus) -> Result<(), StakeError> {
        if !self.status.can_transition_to(to) {
            return Err(StakeError::InvalidTransition {
                from: self.status,
                to,
            });
        }

        self.status = to;

        Ok(())
    }

    fn htlc_transition(&mut self, to: HtlcStatus) -> Result<(), StakeError> {
        if !self.htlc_status.can_transition_to(to) {
            return Err(StakeError::InvalidHtlcTransition {
                from: self.htlc_status,
                to,
            });
        }

        self.htlc_status = to;

        Ok(())
    }
}

/// Parses a base-10 token amount of arbitrary size up to 256 bits.
pub fn parse_amount(raw: &str) -> Result<U256, StakeError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StakeError::InvalidAmount(raw.to_string()));
    }

    U256::from_str_radix(raw, 10).map_err(|_| StakeError::InvalidAmount(raw.to_string()))
}

/// Checks that a stake id only uses the characters of base58 and base64 encodings.
pub fn validate_stake_id(id: &str) -> Result<(), StakeError> {
    let valid = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='));

    if !valid {
        return Err(StakeError::InvalidStakeId(id.to_string()));
    }

    Ok(())
}

/// (De)serializes a [`U256`] as a base-10 string.
mod decimal {
    use ethnum::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;

        super::parse_amount(&raw).map_err(D::Error::custom)
    }
}
