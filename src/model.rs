use serde::{Deserialize, Deserializer, Serialize};

/// One address tracked by the backend. Identity is the `address` string;
/// every poll supersedes the record wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    pub address: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_balance: f64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub token_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub project_count: u64,
    #[serde(default)]
    pub top_tokens: Vec<TokenSummary>,
    #[serde(default)]
    pub top_projects: Vec<ProjectSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSummary {
    pub symbol: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSummary {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_accounts: u64,
    #[serde(default, deserialize_with = "lenient_f64", rename = "totalUSDValue")]
    pub total_usd_value: f64,
}

/// Validated aggregate payload from `/api/balance`. Constructed by the API
/// client only after `globalStats` is known to be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    pub global_stats: GlobalStats,
    #[serde(default)]
    pub top_tokens: Vec<TokenSummary>,
    #[serde(default)]
    pub chains: Vec<ChainSummary>,
}

// The backend is loose about numeric types: balances and counts may arrive
// as JSON numbers or as strings. Unparsable values count as zero.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Num(n)) => n,
        Some(Raw::Text(s)) => s.trim().parse().unwrap_or(0.0),
        None => 0.0,
    })
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Num(n)) if n >= 0.0 => n as u64,
        Some(Raw::Text(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or(0)
        }
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_record_accepts_string_numbers() {
        let json = r#"{
            "address": "0xAAAA000000000000000000000000000000001111",
            "totalBalance": "100.5",
            "tokenCount": "3",
            "projectCount": "2",
            "topTokens": [{"symbol": "ETH", "value": "80.25"}],
            "topProjects": [{"name": "Aave", "value": 20.25}]
        }"#;

        let record: AddressRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.total_balance, 100.5);
        assert_eq!(record.token_count, 3);
        assert_eq!(record.project_count, 2);
        assert_eq!(record.top_tokens[0].value, 80.25);
        assert_eq!(record.top_projects[0].value, 20.25);
    }

    #[test]
    fn unparsable_numbers_default_to_zero() {
        let json = r#"{
            "address": "0xBBBB000000000000000000000000000000002222",
            "totalBalance": "garbage",
            "tokenCount": null
        }"#;

        let record: AddressRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.total_balance, 0.0);
        assert_eq!(record.token_count, 0);
        assert_eq!(record.project_count, 0);
        assert!(record.top_tokens.is_empty());
    }

    #[test]
    fn global_stats_uses_usd_value_key() {
        let json = r#"{"totalAccounts": 12, "totalUSDValue": 34567.89}"#;
        let stats: GlobalStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.total_accounts, 12);
        assert_eq!(stats.total_usd_value, 34567.89);
    }
}
