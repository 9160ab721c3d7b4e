//! Impact-token ownership bookkeeping
//!
//! Tokens represent QALYs attributed to a programme. Ownership changes are
//! kept as an append-only transfer log next to a token -> current owner map.
//! The ledger lives in memory only.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A minted impact token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactToken {
    pub token_id: String,
    pub owner: String,
    /// Programme the QALYs were attributed to
    pub program_id: String,
    pub qalys: f64,
    pub minted_at: DateTime<Utc>,
}

/// One ownership change, in log order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Position in the log, starting at 1
    pub sequence: u64,
    pub token_id: String,
    pub from: String,
    pub to: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    tokens: HashMap<String, ImpactToken>,
    transfers: Vec<TransferRecord>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(
        &mut self,
        token_id: impl Into<String>,
        owner: impl Into<String>,
        program_id: impl Into<String>,
        qalys: f64,
    ) -> Result<&ImpactToken, LedgerError> {
        self.mint_at(token_id, owner, program_id, qalys, Utc::now())
    }

    /// Mint with an explicit timestamp
    pub fn mint_at(
        &mut self,
        token_id: impl Into<String>,
        owner: impl Into<String>,
        program_id: impl Into<String>,
        qalys: f64,
        minted_at: DateTime<Utc>,
    ) -> Result<&ImpactToken, LedgerError> {
        let token_id = token_id.into();
        if self.tokens.contains_key(&token_id) {
            return Err(LedgerError::DuplicateToken(token_id));
        }
        if !qalys.is_finite() || qalys < 0.0 {
            return Err(LedgerError::InvalidQalys(qalys));
        }

        let token = ImpactToken {
            token_id: token_id.clone(),
            owner: owner.into(),
            program_id: program_id.into(),
            qalys,
            minted_at,
        };
        info!("minted token {} ({:.2} QALYs) to {}", token_id, qalys, token.owner);
        Ok(self.tokens.entry(token_id).or_insert(token))
    }

    pub fn transfer(&mut self, token_id: &str, from: &str, to: &str) -> Result<&TransferRecord, LedgerError> {
        self.transfer_at(token_id, from, to, Utc::now())
    }

    /// Move a token from its current owner to `to`
    ///
    /// `from` must match the recorded owner; on any error the ledger is unchanged.
    pub fn transfer_at(
        &mut self,
        token_id: &str,
        from: &str,
        to: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<&TransferRecord, LedgerError> {
        let token = self
            .tokens
            .get_mut(token_id)
            .ok_or_else(|| LedgerError::UnknownToken(token_id.to_string()))?;

        if token.owner != from {
            return Err(LedgerError::OwnerMismatch {
                token_id: token_id.to_string(),
                owner: token.owner.clone(),
                claimed: from.to_string(),
            });
        }
        if from == to {
            return Err(LedgerError::SelfTransfer(token_id.to_string()));
        }

        token.owner = to.to_string();
        self.transfers.push(TransferRecord {
            sequence: self.transfers.len() as u64 + 1,
            token_id: token_id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            timestamp,
        });
        info!("transferred token {token_id} from {from} to {to}");

        Ok(&self.transfers[self.transfers.len() - 1])
    }

    pub fn token(&self, token_id: &str) -> Option<&ImpactToken> {
        self.tokens.get(token_id)
    }

    pub fn owner_of(&self, token_id: &str) -> Option<&str> {
        self.tokens.get(token_id).map(|t| t.owner.as_str())
    }

    /// Every transfer in log order
    pub fn transfers(&self) -> &[TransferRecord] {
        &self.transfers
    }

    /// Transfers of one token in log order
    pub fn history(&self, token_id: &str) -> Vec<&TransferRecord> {
        self.transfers
            .iter()
            .filter(|t| t.token_id == token_id)
            .collect()
    }

    /// Tokens currently held by `owner`, sorted by id
    pub fn tokens_owned_by(&self, owner: &str) -> Vec<&ImpactToken> {
        let mut owned: Vec<_> = self.tokens.values().filter(|t| t.owner == owner).collect();
        owned.sort_by(|a, b| a.token_id.cmp(&b.token_id));
        owned
    }

    pub fn total_qalys_owned_by(&self, owner: &str) -> f64 {
        self.tokens_owned_by(owner).iter().map(|t| t.qalys).sum()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    fn ledger() -> TokenLedger {
        let mut ledger = TokenLedger::new();
        ledger.mint_at("LDL1-0001", "issuer", "LDL1", 120.5, at(8)).unwrap();
        ledger.mint_at("BP3-0001", "issuer", "BP3", 80.0, at(8)).unwrap();
        ledger
    }

    #[test]
    fn test_mint_and_duplicate() {
        let mut ledger = ledger();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.owner_of("LDL1-0001"), Some("issuer"));

        let err = ledger.mint("LDL1-0001", "someone", "LDL1", 1.0).unwrap_err();
        assert_eq!(err, LedgerError::DuplicateToken("LDL1-0001".into()));

        let err = ledger.mint("X-1", "someone", "X", -1.0).unwrap_err();
        assert_eq!(err, LedgerError::InvalidQalys(-1.0));
    }

    #[test]
    fn test_transfer_chain() {
        let mut ledger = ledger();
        let record = ledger.transfer_at("LDL1-0001", "issuer", "alice", at(9)).unwrap();
        assert_eq!(record.sequence, 1);
        ledger.transfer_at("LDL1-0001", "alice", "bob", at(10)).unwrap();
        ledger.transfer_at("BP3-0001", "issuer", "alice", at(11)).unwrap();

        assert_eq!(ledger.owner_of("LDL1-0001"), Some("bob"));
        let history = ledger.history("LDL1-0001");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].to, "alice");
        assert_eq!(history[1].from, "alice");
        assert_eq!(history[1].timestamp, at(10));

        assert_eq!(ledger.transfers().len(), 3);
        assert_eq!(ledger.transfers()[2].sequence, 3);
        assert_eq!(ledger.tokens_owned_by("alice").len(), 1);
        assert_eq!(ledger.total_qalys_owned_by("bob"), 120.5);
    }

    #[test]
    fn test_wrong_owner_leaves_log_unchanged() {
        let mut ledger = ledger();
        let err = ledger.transfer("LDL1-0001", "mallory", "mallory2").unwrap_err();
        assert_eq!(
            err,
            LedgerError::OwnerMismatch {
                token_id: "LDL1-0001".into(),
                owner: "issuer".into(),
                claimed: "mallory".into(),
            }
        );
        assert!(ledger.transfers().is_empty());
        assert_eq!(ledger.owner_of("LDL1-0001"), Some("issuer"));
    }

    #[test]
    fn test_unknown_and_self_transfer() {
        let mut ledger = ledger();
        assert_eq!(
            ledger.transfer("nope", "issuer", "alice").unwrap_err(),
            LedgerError::UnknownToken("nope".into())
        );
        assert_eq!(
            ledger.transfer("BP3-0001", "issuer", "issuer").unwrap_err(),
            LedgerError::SelfTransfer("BP3-0001".into())
        );
        assert!(ledger.transfers().is_empty());
    }
}
