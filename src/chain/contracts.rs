//! CCTP contract ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings for the three
//! contracts a transfer touches: the USDC token, the source TokenMessenger and
//! the MessageTransmitter on both sides.

use alloy::sol;

sol! {
    /// Standard ERC20 interface (USDC)
    #[sol(rpc)]
    contract ERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// CCTP TokenMessenger: burns USDC and hands a message to the transmitter
    #[sol(rpc)]
    contract TokenMessenger {
        /// Burn `amount` of `burnToken` and request a mint on `destinationDomain`
        ///
        /// `mintRecipient` is the recipient in canonical bytes32 form.
        function depositForBurn(
            uint256 amount,
            uint32 destinationDomain,
            bytes32 mintRecipient,
            address burnToken
        ) external returns (uint64 nonce);
    }

    /// CCTP MessageTransmitter: emits outbound messages, verifies inbound ones
    #[sol(rpc)]
    contract MessageTransmitter {
        /// Mint on this chain given a message and Circle's attestation over it
        function receiveMessage(bytes message, bytes attestation) external returns (bool success);

        /// Non-zero once the (sourceDomain, nonce) pair has been received
        function usedNonces(bytes32 sourceAndNonce) external view returns (uint256);

        /// This chain's CCTP domain
        function localDomain() external view returns (uint32);

        event MessageSent(bytes message);
    }
}
