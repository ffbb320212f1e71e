use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::address::Address;

/// Token amounts in base units. `decimals` only fixes the display scale;
/// all stored arithmetic happens on these integers.
pub type Amount = u128;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("balance too low: {account} holds {balance}, tried to move {amount}")]
    InsufficientBalance {
        account: Address,
        balance: Amount,
        amount: Amount,
    },
    #[error(
        "allowance too low: {spender} may spend {allowance} on behalf of {owner}, tried to move {amount}"
    )]
    AllowanceTooLow {
        owner: Address,
        spender: Address,
        allowance: Amount,
        amount: Amount,
    },
}

/// Notification emitted after each successful mutating call. Events are
/// appended to the ledger's log only once the state change is applied, so
/// a rejected call can never leave one behind.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenEvent {
    Transfer {
        from: Address,
        to: Address,
        amount: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: Amount,
    },
}

/// A mutating call with its authenticated caller bound by the host.
///
/// The caller is always an explicit field, never ambient state inside the
/// ledger; whoever dispatches a `TokenCall` is vouching for the identity.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenCall {
    Transfer {
        caller: Address,
        to: Address,
        amount: Amount,
    },
    Approve {
        caller: Address,
        spender: Address,
        amount: Amount,
    },
    TransferFrom {
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    },
}

/// Point-in-time view of the ledger with a deterministic digest over the
/// balance and allowance tables.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: Amount,
    pub balances: BTreeMap<Address, Amount>,
    pub allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
    pub events: Vec<TokenEvent>,
    pub state_root: [u8; 32],
}

/// The token ledger: a fixed supply split across account balances, plus
/// delegated spending limits between account pairs.
///
/// Invariant: the sum of all balances equals `total_supply` at every
/// observable point; supply is set once at construction and there is no
/// mint or burn. Accounts never seen hold an implicit zero.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenLedger {
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: Amount,
    balances: BTreeMap<Address, Amount>,
    allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
    events: Vec<TokenEvent>,
}

impl TokenLedger {
    /// Create the ledger, crediting the entire supply to `creator`.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        initial_supply: Amount,
        creator: Address,
    ) -> Self {
        let mut balances = BTreeMap::new();
        balances.insert(creator, initial_supply);
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            total_supply: initial_supply,
            balances,
            allowances: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, account: Address) -> Amount {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.allowances
            .get(&owner)
            .and_then(|spenders| spenders.get(&spender))
            .copied()
            .unwrap_or(0)
    }

    /// Events emitted so far, in call order.
    pub fn events(&self) -> &[TokenEvent] {
        &self.events
    }

    /// Drain the event log, handing the emitted events to an observer.
    pub fn take_events(&mut self) -> Vec<TokenEvent> {
        std::mem::take(&mut self.events)
    }

    /// Move `amount` from the caller's balance to `to`.
    ///
    /// A self-transfer is a net no-op but still succeeds and emits.
    pub fn transfer(
        &mut self,
        caller: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.debit(caller, amount)?;
        self.credit(to, amount);
        self.events.push(TokenEvent::Transfer {
            from: caller,
            to,
            amount,
        });
        Ok(())
    }

    /// Set the caller's allowance for `spender` to exactly `amount`.
    ///
    /// Overwrites any prior limit rather than adding to it; zero revokes.
    pub fn approve(&mut self, caller: Address, spender: Address, amount: Amount) {
        self.allowances
            .entry(caller)
            .or_default()
            .insert(spender, amount);
        self.events.push(TokenEvent::Approval {
            owner: caller,
            spender,
            amount,
        });
    }

    /// Move `amount` from `from` to `to` on the caller's delegated limit.
    ///
    /// The allowance is checked strictly before the balance: an
    /// under-allowed caller sees [`LedgerError::AllowanceTooLow`] even when
    /// the source balance is also short.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let allowance = self.allowance(from, caller);
        if allowance < amount {
            return Err(LedgerError::AllowanceTooLow {
                owner: from,
                spender: caller,
                allowance,
                amount,
            });
        }
        self.debit(from, amount)?;
        self.allowances
            .entry(from)
            .or_default()
            .insert(caller, allowance - amount);
        self.credit(to, amount);
        self.events.push(TokenEvent::Transfer { from, to, amount });
        Ok(())
    }

    /// Dispatch a host-bound call to the matching operation.
    pub fn apply(&mut self, call: &TokenCall) -> Result<(), LedgerError> {
        match *call {
            TokenCall::Transfer { caller, to, amount } => self.transfer(caller, to, amount),
            TokenCall::Approve {
                caller,
                spender,
                amount,
            } => {
                self.approve(caller, spender, amount);
                Ok(())
            }
            TokenCall::TransferFrom {
                caller,
                from,
                to,
                amount,
            } => self.transfer_from(caller, from, to, amount),
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            total_supply: self.total_supply,
            balances: self.balances.clone(),
            allowances: self.allowances.clone(),
            events: self.events.clone(),
            state_root: compute_state_root(&self.balances, &self.allowances),
        }
    }

    // The balance check happens before any write, so a rejected debit
    // leaves the table untouched, not even an implicit zero entry.
    fn debit(&mut self, account: Address, amount: Amount) -> Result<(), LedgerError> {
        let balance = self.balance_of(account);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account,
                balance,
                amount,
            });
        }
        self.balances.insert(account, balance - amount);
        Ok(())
    }

    // Cannot overflow: total credited never exceeds the fixed supply.
    fn credit(&mut self, account: Address, amount: Amount) {
        *self.balances.entry(account).or_default() += amount;
    }
}

fn compute_state_root(
    balances: &BTreeMap<Address, Amount>,
    allowances: &BTreeMap<Address, BTreeMap<Address, Amount>>,
) -> [u8; 32] {
    let mut leaves: Vec<[u8; 32]> = Vec::new();
    for (account, balance) in balances {
        let mut hasher = Sha256::new();
        hasher.update(b"bal");
        hasher.update(account.as_bytes());
        hasher.update(balance.to_le_bytes());
        leaves.push(hasher.finalize().into());
    }
    for (owner, spenders) in allowances {
        for (spender, limit) in spenders {
            let mut hasher = Sha256::new();
            hasher.update(b"allow");
            hasher.update(owner.as_bytes());
            hasher.update(spender.as_bytes());
            hasher.update(limit.to_le_bytes());
            leaves.push(hasher.finalize().into());
        }
    }
    fold_merkle(leaves)
}

fn fold_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"gcn-ledger-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity(leaves.len().div_ceil(2));
        for pair in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(pair[0]);
            // odd leaf pairs with itself
            hasher.update(pair.get(1).unwrap_or(&pair[0]));
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}
