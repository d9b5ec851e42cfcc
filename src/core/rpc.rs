//! EIP-1193 method names, event names and error codes
//!
//! Centralized registry so classification and the browser adapter agree.

/// JSON-RPC methods sent through `provider.request({ method, params })`
pub mod method {
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
}

/// Provider events
pub mod event {
    pub const ACCOUNTS_CHANGED: &str = "accountsChanged";
}

/// Provider error codes
pub mod code {
    /// User rejected the request.
    pub const USER_REJECTED: i64 = 4001;
    /// Requested method/account not authorized.
    pub const UNAUTHORIZED: i64 = 4100;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const DISCONNECTED: i64 = 4900;
    pub const CHAIN_DISCONNECTED: i64 = 4901;
    /// Generic JSON-RPC server error; nodes report insufficient funds with it.
    pub const SERVER_ERROR: i64 = -32000;
    pub const TRANSACTION_REJECTED: i64 = -32003;
    pub const INTERNAL_ERROR: i64 = -32603;
}
