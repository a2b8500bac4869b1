use bcrypt::{hash, verify, DEFAULT_COST};

/// bcrypt wrapper. Hashing is CPU-bound, so both calls hop onto the blocking pool.
#[derive(Clone, Copy)]
pub struct PasswordService {
    cost: u32,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordService {
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let password = password.to_owned();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || hash(password, cost)).await??;
        Ok(hashed)
    }

    pub async fn compare_password(&self, password: &str, hashed: &str) -> anyhow::Result<bool> {
        let password = password.to_owned();
        let hashed = hashed.to_owned();
        let ok = tokio::task::spawn_blocking(move || verify(password, &hashed)).await??;
        Ok(ok)
    }
}
