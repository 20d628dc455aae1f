use sha2::{Digest, Sha256};

/// Derives the opaque client identifier from a peer address and the server secret
#[derive(Clone)]
pub struct ClientKeyHasher {
    server_secret: String,
}

impl ClientKeyHasher {
    pub fn new(server_secret: String) -> Self {
        Self { server_secret }
    }

    /// Hash a peer address into a 64-character hex key
    ///
    /// The raw address never leaves this function; only the digest is
    /// stored or used for rate limiting.
    pub fn hash(&self, peer: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(peer.as_bytes());
        hasher.update(b":");
        hasher.update(self.server_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}
