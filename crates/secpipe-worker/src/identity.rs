//! Worker identity generation.
//!
//! The source uses a string `"worker-N"`; `{hostname}-{pid}-{nonce}` is a
//! portable equivalent that stays unique per process instance without a
//! shared counter.

pub fn generate_worker_id() -> String {
    let hostname = hostname();
    let pid = std::process::id();
    let nonce = uuid::Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)).simple().to_string();
    format!("{hostname}-{pid}-{}", &nonce[nonce.len() - 8..])
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| ::hostname::get().ok().and_then(|s| s.into_string().ok()))
        .unwrap_or_else(|| "worker".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_per_call() {
        let a = generate_worker_id();
        let b = generate_worker_id();
        assert_ne!(a, b);
        assert!(a.contains(&std::process::id().to_string()));
    }
}
