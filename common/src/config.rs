pub const VERSION: &str = env!("BUILD_VERSION");

// ===== WIRE LAYOUT =====

// Size of a public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;
// Size of the signature slot appended to every transaction
pub const SIGNATURE_SIZE: usize = 64;

// Fixed header: source (32) + destination (32) + amount (8) + tick (4)
// + selector (2) + payload size (2)
pub const TRANSACTION_HEADER_SIZE: usize = PUBLIC_KEY_SIZE + PUBLIC_KEY_SIZE + 8 + 4 + 2 + 2;

// Byte offsets inside the header
pub const SOURCE_OFFSET: usize = 0;
pub const DESTINATION_OFFSET: usize = 32;
pub const AMOUNT_OFFSET: usize = 64;
pub const TICK_OFFSET_IN_HEADER: usize = 72;
pub const SELECTOR_OFFSET: usize = 76;
pub const PAYLOAD_SIZE_OFFSET: usize = 78;

// Payload size is carried as an uint16
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

// ===== IDENTITIES =====

// Textual identity length: 56 body letters + 4 checksum letters
pub const IDENTITY_LENGTH: usize = 60;
pub const IDENTITY_BODY_LENGTH: usize = 56;
pub const IDENTITY_CHECKSUM_LENGTH: usize = 4;
// Letters used per 64-bit limb of the public key
pub const IDENTITY_LETTERS_PER_LIMB: usize = 14;

// ===== TICKS =====

// Number of ticks added to the current tick to build the target tick
// Overridable through the wallet configuration
pub const DEFAULT_TICK_OFFSET: u32 = 10;

// ===== FAUCET =====

// Minimum interval between two claims of the same (network, address)
pub const DEFAULT_COOLDOWN_SECONDS: u64 = 24 * 60 * 60;

// Static checks
const _: () = assert!(
    TRANSACTION_HEADER_SIZE == 80,
    "Transaction header must be 80 bytes"
);
const _: () = assert!(
    PAYLOAD_SIZE_OFFSET + 2 == TRANSACTION_HEADER_SIZE,
    "Payload size must be the last header field"
);
const _: () = assert!(
    IDENTITY_BODY_LENGTH + IDENTITY_CHECKSUM_LENGTH == IDENTITY_LENGTH,
    "Identity is made of its body and checksum"
);
const _: () = assert!(DEFAULT_TICK_OFFSET >= 1, "Tick offset must be at least 1");
