use crate::event_sourcing::Aggregate;

use super::commands::AccountCommand;
use super::errors::AccountError;
use super::events::{AccountCreated, AccountEvent, MoneyDeposited, MoneyWithdrawn};
use super::value_objects::AccountNumber;

// ============================================================================
// Account Aggregate - Business Logic
// ============================================================================
//
// Pure state machine: the balance is the fold of the account's event stream
// and nothing else. Commands emit events; the next state is always obtained
// by folding those events through `apply_event`, the single transition
// function shared with replay.
//
// Policy decisions (minimum amounts, name rules, overdraft) do NOT live
// here - they belong to the command handler. The movements themselves are
// unconditional at this layer.
//
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountAggregate {
    account_number: AccountNumber,
    name: String,
    balance: i64,
    version: i64,
}

impl AccountAggregate {
    pub fn account_number(&self) -> &AccountNumber {
        &self.account_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current balance in minor currency units.
    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Whether this value holds a created account, as opposed to the
    /// identity value replay starts from.
    pub fn is_initialized(&self) -> bool {
        !self.account_number.as_str().is_empty()
    }

    /// Open a new account. Emits one `Created` event.
    pub fn open(
        account_number: AccountNumber,
        name: impl Into<String>,
        balance: i64,
    ) -> Result<(Self, Vec<AccountEvent>), AccountError> {
        Self::default().execute(&AccountCommand::OpenAccount {
            account_number,
            name: name.into(),
            balance,
        })
    }

    /// Deposit into this account. Emits one `Deposited` event.
    pub fn deposit(&self, amount: i64) -> Result<(Self, Vec<AccountEvent>), AccountError> {
        self.execute(&AccountCommand::Deposit {
            account_number: self.account_number.clone(),
            amount,
        })
    }

    /// Withdraw from this account. Emits one `Withdrawn` event.
    pub fn withdraw(&self, amount: i64) -> Result<(Self, Vec<AccountEvent>), AccountError> {
        self.execute(&AccountCommand::Withdraw {
            account_number: self.account_number.clone(),
            amount,
        })
    }

    /// Emit the command's events, then fold them into the next state.
    fn execute(
        &self,
        command: &AccountCommand,
    ) -> Result<(Self, Vec<AccountEvent>), AccountError> {
        let events = self.handle_command(command)?;
        let mut next = self.clone();
        for event in &events {
            next.apply_event(event)?;
        }
        Ok((next, events))
    }
}

impl Aggregate for AccountAggregate {
    type Event = AccountEvent;
    type Command = AccountCommand;
    type Error = AccountError;

    fn apply_event(&mut self, event: &AccountEvent) -> Result<(), AccountError> {
        match event {
            AccountEvent::Created(e) => {
                if self.is_initialized() {
                    return Err(AccountError::AlreadyInitialized(e.account_number.clone()));
                }
                self.account_number = e.account_number.clone();
                self.name = e.name.clone();
                self.balance = e.balance;
            }
            AccountEvent::Deposited(e) => {
                if !self.is_initialized() {
                    return Err(AccountError::NotInitialized);
                }
                self.balance += e.amount;
            }
            AccountEvent::Withdrawn(e) => {
                if !self.is_initialized() {
                    return Err(AccountError::NotInitialized);
                }
                self.balance -= e.amount;
            }
        }

        self.version += 1;
        Ok(())
    }

    fn handle_command(&self, command: &AccountCommand) -> Result<Vec<AccountEvent>, AccountError> {
        match command {
            AccountCommand::OpenAccount {
                account_number,
                name,
                balance,
            } => Ok(vec![AccountEvent::Created(AccountCreated {
                account_number: account_number.clone(),
                name: name.clone(),
                balance: *balance,
            })]),

            AccountCommand::Deposit {
                account_number,
                amount,
            } => Ok(vec![AccountEvent::Deposited(MoneyDeposited {
                account_number: account_number.clone(),
                amount: *amount,
            })]),

            AccountCommand::Withdraw {
                account_number,
                amount,
            } => Ok(vec![AccountEvent::Withdrawn(MoneyWithdrawn {
                account_number: account_number.clone(),
                amount: *amount,
            })]),
        }
    }

    fn aggregate_id(&self) -> &str {
        self.account_number.as_str()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
