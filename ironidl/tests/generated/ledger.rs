// Rust bindings for the `ledger` interface.
// This file is auto-generated by ironidl-codegen. Do not edit manually.

use ironidl::{Agent, ArgBuilder, CallError, CallMode, IdlType, Principal, ReplyDecoder};

/// IDL type `Tokens`.
#[derive(Debug, Clone, PartialEq, IdlType)]
pub struct Tokens {
    #[idl(id = 5035232, name = "e8s")]
    pub e8s: u64,
}

/// IDL type `Account`.
#[derive(Debug, Clone, PartialEq, IdlType)]
pub struct Account {
    #[idl(id = 947296307, name = "owner")]
    pub owner: Principal,
    #[idl(id = 1349681965, name = "subaccount")]
    pub subaccount: Option<Vec<u8>>,
}

/// IDL type `TransferResult`.
#[derive(Debug, Clone, PartialEq, IdlType)]
pub enum TransferResult {
    #[idl(id = 17724, name = "Ok")]
    Ok(u128),
    #[idl(id = 3456837, name = "Err")]
    Err(String),
}

/// IDL type `History`.
pub type History = Option<HistoryInner>;

/// Inline record `HistoryInner`.
#[derive(Debug, Clone, PartialEq, IdlType)]
pub struct HistoryInner {
    #[idl(id = 3573748184, name = "amount")]
    pub amount: Tokens,
    #[idl(id = 598785079, name = "previous")]
    pub previous: Box<History>,
}

/// Client for the `ledger` service.
#[derive(Debug, Clone)]
pub struct Ledger<Transport: Agent> {
    agent: Transport,
    destination: Principal,
}

impl<Transport: Agent> Ledger<Transport> {
    /// Creates a client calling `destination`.
    pub const fn new(agent: Transport, destination: Principal) -> Self {
        Self { agent, destination }
    }

    /// Returns the agent carrying calls.
    pub const fn agent(&self) -> &Transport {
        &self.agent
    }

    /// Returns the principal calls are sent to.
    pub const fn destination(&self) -> &Principal {
        &self.destination
    }

    /// Calls `balance` as a query.
    ///
    /// # Errors
    /// Returns [`CallError`] if the call fails or the reply does not decode.
    pub fn balance(&self, arg0: &Account) -> Result<Tokens, CallError> {
        let args = ArgBuilder::new().arg(arg0).encode()?;
        let reply = self
            .agent
            .call(&self.destination, "balance", CallMode::Query, args)
            .map_err(CallError::transport)?;
        let mut reply = ReplyDecoder::new(&reply)?;
        let ret0 = reply.read::<Tokens>()?;
        reply.finish()?;
        Ok(ret0)
    }

    /// Calls `history` as a query.
    ///
    /// # Errors
    /// Returns [`CallError`] if the call fails or the reply does not decode.
    pub fn history(&self, arg0: &Account) -> Result<History, CallError> {
        let args = ArgBuilder::new().arg(arg0).encode()?;
        let reply = self
            .agent
            .call(&self.destination, "history", CallMode::Query, args)
            .map_err(CallError::transport)?;
        let mut reply = ReplyDecoder::new(&reply)?;
        let ret0 = reply.read::<History>()?;
        reply.finish()?;
        Ok(ret0)
    }

    /// Calls `notify` as a one-way call.
    ///
    /// # Errors
    /// Returns [`CallError`] if the call fails or the reply does not decode.
    pub fn notify(&self, arg0: &String) -> Result<(), CallError> {
        let args = ArgBuilder::new().arg(arg0).encode()?;
        self
            .agent
            .call(&self.destination, "notify", CallMode::Oneway, args)
            .map_err(CallError::transport)?;
        Ok(())
    }

    /// Calls `transfer` as an update.
    ///
    /// # Errors
    /// Returns [`CallError`] if the call fails or the reply does not decode.
    pub fn transfer(&self, arg0: &Account, arg1: &Tokens) -> Result<TransferResult, CallError> {
        let args = ArgBuilder::new().arg(arg0).arg(arg1).encode()?;
        let reply = self
            .agent
            .call(&self.destination, "transfer", CallMode::Update, args)
            .map_err(CallError::transport)?;
        let mut reply = ReplyDecoder::new(&reply)?;
        let ret0 = reply.read::<TransferResult>()?;
        reply.finish()?;
        Ok(ret0)
    }
}
