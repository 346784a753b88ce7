use super::value_objects::AccountNumber;

// ============================================================================
// Account Domain Commands
// ============================================================================

#[derive(Debug, Clone)]
pub enum AccountCommand {
    OpenAccount {
        account_number: AccountNumber,
        name: String,
        balance: i64,
    },
    Deposit {
        account_number: AccountNumber,
        amount: i64,
    },
    Withdraw {
        account_number: AccountNumber,
        amount: i64,
    },
}

impl AccountCommand {
    pub fn account_number(&self) -> &AccountNumber {
        match self {
            AccountCommand::OpenAccount { account_number, .. } => account_number,
            AccountCommand::Deposit { account_number, .. } => account_number,
            AccountCommand::Withdraw { account_number, .. } => account_number,
        }
    }

    /// Command name, used in logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            AccountCommand::OpenAccount { .. } => "OpenAccount",
            AccountCommand::Deposit { .. } => "Deposit",
            AccountCommand::Withdraw { .. } => "Withdraw",
        }
    }
}
