use std::fmt;

use serde_json::json;

use crate::naming::ResourceName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsAction {
    Create,
    Delete,
}

impl DnsAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for DnsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First hosted zone of the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    /// Zone id without the `/hostedzone/` prefix
    pub id: String,
    /// Zone domain as reported by the provider, e.g. `example.com.`
    pub domain: String,
}

/// Load balancer an alias record points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTarget {
    /// Canonical hosted zone id of the load balancer
    pub hosted_zone_id: String,
    pub dns_name: String,
}

/// A single alias-record change, built fresh from live lookups on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecordIntent {
    pub action: DnsAction,
    pub zone_id: String,
    pub record_name: String,
    pub alias_target_id: String,
    pub alias_target_domain: String,
}

impl DnsRecordIntent {
    /// Alias `{resource}.{zone}` to the load balancer.
    ///
    /// A blank zone domain or load balancer name stays blank so that
    /// [`missing_fields`](Self::missing_fields) reports it.
    pub fn new(
        action: DnsAction,
        resource: &ResourceName,
        zone: &HostedZone,
        target: &AliasTarget,
    ) -> Self {
        let dns_name = target.dns_name.trim();
        let alias_target_domain = if is_blank(dns_name) {
            String::new()
        } else if dns_name.ends_with('.') {
            dns_name.to_owned()
        } else {
            format!("{dns_name}.")
        };
        let record_name = if is_blank(&zone.domain) {
            String::new()
        } else {
            resource.dns_record_name(zone.domain.trim())
        };

        Self {
            action,
            zone_id: zone.id.clone(),
            record_name,
            alias_target_id: target.hosted_zone_id.clone(),
            alias_target_domain,
        }
    }

    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("zoneId", &self.zone_id),
            ("recordName", &self.record_name),
            ("aliasTargetId", &self.alias_target_id),
            ("aliasTargetDomain", &self.alias_target_domain),
        ]
        .into_iter()
        .filter(|(_, value)| is_blank(value))
        .map(|(name, _)| name)
        .collect()
    }

    /// Route53 change batch for this intent.
    pub fn change_batch(&self) -> serde_json::Value {
        json!({
            "Comment": format!("spectrum {} {}", self.action, self.record_name),
            "Changes": [{
                "Action": self.action.as_str(),
                "ResourceRecordSet": {
                    "Name": self.record_name,
                    "Type": "A",
                    "AliasTarget": {
                        "HostedZoneId": self.alias_target_id,
                        "DNSName": self.alias_target_domain,
                        "EvaluateTargetHealth": false
                    }
                }
            }]
        })
    }
}

/// Empty, whitespace, or only the root label.
fn is_blank(value: &str) -> bool {
    value.trim().trim_end_matches('.').is_empty()
}
