//! Short-lived reservations of coordinator UTXOs so that concurrent assemblies do not pick the
//! same fee inputs.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::{Duration, Instant},
};

use bitcoin::{Amount, OutPoint, Txid};
use gbpl_custody_primitives::types::FeeUtxo;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{
    errors::AssembleError,
    fees::{select_fee_utxos, FeeSelection},
};

#[derive(Debug, Clone, Copy)]
struct Lease {
    /// The deposit whose lock transaction spends the outpoint.
    owner: Txid,

    expires_at: Instant,
}

/// Lease table over the coordinator's UTXOs.
///
/// A lease is owned by a deposit txid. Assembling again for the same deposit replaces its leases
/// once the new assembly is committed, and leases expire on their own after the configured TTL so
/// that abandoned assemblies do not lock funds forever.
#[derive(Debug)]
pub struct UtxoLeases {
    ttl: Duration,
    leases: Mutex<BTreeMap<OutPoint, Lease>>,
}

/// Leases taken by [`UtxoLeases::select_and_lease`] that are not yet final.
///
/// Until it is passed to [`UtxoLeases::commit`] or [`UtxoLeases::abort`], the owner holds both the
/// new selection and whatever it had leased before.
#[derive(Debug)]
#[must_use = "pending leases must be committed or aborted"]
pub struct PendingLeases {
    owner: Txid,
    selected: BTreeSet<OutPoint>,
    previous: BTreeMap<OutPoint, Lease>,
}

impl UtxoLeases {
    /// Creates an empty lease table whose leases last `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            leases: Mutex::new(BTreeMap::new()),
        }
    }

    /// Selects fee inputs among the `utxos` that are not leased to another deposit and leases
    /// them to `owner`.
    ///
    /// Selection and leasing happen under a single lock. A failed selection leaves the table
    /// untouched. On success the leases `owner` held before are kept until the returned
    /// [`PendingLeases`] is committed.
    pub fn select_and_lease(
        &self,
        owner: Txid,
        utxos: impl IntoIterator<Item = FeeUtxo>,
        target: Amount,
        dust_limit: Amount,
    ) -> Result<(FeeSelection, PendingLeases), AssembleError> {
        let now = Instant::now();
        let mut leases = self.leases.lock();

        leases.retain(|_, lease| lease.expires_at > now);

        let available = utxos.into_iter().filter(|utxo| {
            !leases
                .get(&utxo.outpoint)
                .is_some_and(|lease| lease.owner != owner)
        });

        let selection = select_fee_utxos(available, target, dust_limit)?;

        let previous = leases
            .iter()
            .filter(|(_, lease)| lease.owner == owner)
            .map(|(outpoint, lease)| (*outpoint, *lease))
            .collect();

        let expires_at = now + self.ttl;
        let mut selected = BTreeSet::new();
        for utxo in &selection.inputs {
            trace!(outpoint = %utxo.outpoint, %owner, "leasing fee utxo");
            leases.insert(utxo.outpoint, Lease { owner, expires_at });
            selected.insert(utxo.outpoint);
        }

        debug!(%owner, count = selected.len(), "leased fee utxos");

        Ok((
            selection,
            PendingLeases {
                owner,
                selected,
                previous,
            },
        ))
    }

    /// Makes a selection final and drops the leases its owner held for an earlier assembly.
    pub fn commit(&self, pending: PendingLeases) {
        let PendingLeases {
            owner, selected, ..
        } = pending;

        self.leases
            .lock()
            .retain(|outpoint, lease| lease.owner != owner || selected.contains(outpoint));
    }

    /// Undoes a selection, giving its owner back exactly the leases it held before.
    pub fn abort(&self, pending: PendingLeases) {
        let PendingLeases {
            owner,
            selected,
            previous,
        } = pending;

        let mut leases = self.leases.lock();
        for outpoint in selected {
            match previous.get(&outpoint) {
                Some(lease) => {
                    leases.insert(outpoint, *lease);
                }
                None => {
                    if leases.get(&outpoint).is_some_and(|lease| lease.owner == owner) {
                        leases.remove(&outpoint);
                    }
                }
            }
        }

        debug!(%owner, "restored previous fee utxo leases");
    }

    /// Drops every lease held by `owner`.
    pub fn release(&self, owner: &Txid) {
        self.leases.lock().retain(|_, lease| lease.owner != *owner);
    }

    /// Whether `outpoint` is currently leased.
    pub fn is_leased(&self, outpoint: &OutPoint) -> bool {
        self.leases
            .lock()
            .get(outpoint)
            .is_some_and(|lease| lease.expires_at > Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use bitcoin::hashes::Hash;

    use super::*;

    const TARGET: Amount = Amount::from_sat(1_800);
    const DUST: Amount = Amount::from_sat(546);

    fn utxo(tag: u8, sats: u64) -> FeeUtxo {
        FeeUtxo::new(
            OutPoint {
                txid: Txid::from_byte_array([tag; 32]),
                vout: 0,
            },
            Amount::from_sat(sats),
            true,
        )
    }

    fn owner(tag: u8) -> Txid {
        Txid::from_byte_array([0xf0 | tag; 32])
    }

    /// Selects and commits in one go, returning the leased outpoints.
    fn lease(
        leases: &UtxoLeases,
        owner: Txid,
        utxos: impl IntoIterator<Item = FeeUtxo>,
    ) -> Result<Vec<FeeUtxo>, AssembleError> {
        let (selection, pending) = leases.select_and_lease(owner, utxos, TARGET, DUST)?;
        leases.commit(pending);

        Ok(selection.inputs)
    }

    #[test]
    fn test_leased_utxos_are_skipped() {
        let leases = UtxoLeases::new(Duration::from_secs(600));
        let utxos = [utxo(1, 5_000), utxo(2, 5_000)];

        let first = lease(&leases, owner(1), utxos).unwrap();
        let second = lease(&leases, owner(2), utxos).unwrap();

        assert_eq!(first, vec![utxos[0]]);
        assert_eq!(second, vec![utxos[1]]);
        assert!(leases.is_leased(&utxos[0].outpoint));

        assert!(matches!(
            lease(&leases, owner(3), utxos),
            Err(AssembleError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_reassembly_replaces_own_leases() {
        let leases = UtxoLeases::new(Duration::from_secs(600));
        let utxos = [utxo(1, 5_000), utxo(2, 5_000)];

        lease(&leases, owner(1), [utxos[0]]).unwrap();
        let again = lease(&leases, owner(1), [utxos[1]]).expect("a deposit can lease other utxos");

        assert_eq!(again, vec![utxos[1]]);
        assert!(
            !leases.is_leased(&utxos[0].outpoint),
            "committing a new assembly frees the previous inputs"
        );

        let reused =
            lease(&leases, owner(1), [utxos[1]]).expect("a deposit can reuse its own leases");
        assert_eq!(reused, vec![utxos[1]]);

        leases.release(&owner(1));
        assert!(!leases.is_leased(&utxos[0].outpoint));
        assert!(!leases.is_leased(&utxos[1].outpoint));
    }

    #[test]
    fn test_failed_reassembly_keeps_previous_leases() {
        let leases = UtxoLeases::new(Duration::from_secs(600));
        let funded = utxo(1, 5_000);

        lease(&leases, owner(1), [funded]).unwrap();

        assert!(matches!(
            leases.select_and_lease(owner(1), [], TARGET, DUST),
            Err(AssembleError::InsufficientFunds { .. })
        ));
        assert!(leases.is_leased(&funded.outpoint));

        assert!(
            matches!(
                lease(&leases, owner(2), [funded]),
                Err(AssembleError::InsufficientFunds { .. })
            ),
            "another deposit must not get an input of a stored assembly"
        );
    }

    #[test]
    fn test_aborted_reassembly_restores_previous_leases() {
        let leases = UtxoLeases::new(Duration::from_secs(600));
        let utxos = [utxo(1, 5_000), utxo(2, 5_000)];

        lease(&leases, owner(1), [utxos[0]]).unwrap();

        let (selection, pending) = leases
            .select_and_lease(owner(1), [utxos[1]], TARGET, DUST)
            .unwrap();
        assert_eq!(selection.inputs, vec![utxos[1]]);
        assert!(
            leases.is_leased(&utxos[0].outpoint),
            "pending selection keeps the earlier inputs"
        );

        leases.abort(pending);

        assert!(leases.is_leased(&utxos[0].outpoint));
        assert!(!leases.is_leased(&utxos[1].outpoint));
        assert_eq!(lease(&leases, owner(2), utxos).unwrap(), vec![utxos[1]]);
    }

    #[test]
    fn test_leases_expire() {
        let leases = UtxoLeases::new(Duration::ZERO);
        let utxos = [utxo(1, 5_000)];

        lease(&leases, owner(1), utxos).unwrap();

        assert!(!leases.is_leased(&utxos[0].outpoint));
        assert!(lease(&leases, owner(2), utxos).is_ok());
    }

    #[test]
    fn test_concurrent_assemblies_never_share_inputs() {
        let leases = Arc::new(UtxoLeases::new(Duration::from_secs(600)));
        let utxos: Vec<FeeUtxo> = (1..=8).map(|tag| utxo(tag, 2_000)).collect();

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let leases = leases.clone();
                let utxos = utxos.clone();
                thread::spawn(move || lease(&leases, owner(i), utxos))
            })
            .collect();

        let mut selected: Vec<OutPoint> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap().unwrap())
            .map(|utxo| utxo.outpoint)
            .collect();

        let total = selected.len();
        selected.sort();
        selected.dedup();

        assert_eq!(total, 8);
        assert_eq!(selected.len(), 8, "no utxo may be leased twice");
    }
}
