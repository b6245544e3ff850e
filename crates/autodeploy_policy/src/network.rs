//! Deterministic CIDR allocation.

use autodeploy_spec::{NetworkPlan, SubnetPlan};
use ipnet::Ipv4Net;

use crate::error::{PolicyError, PolicyResult};
use crate::tables::NetworkPolicy;

/// Shape of the network to allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    pub public_zones: u8,
    pub private_zones: u8,
    pub nat_gateway: bool,
}

/// Allocate subnets from the policy's VPC block.
///
/// Subnet `n` of the block is the `n`-th `/prefix` network; public subnets
/// start at `public_offset`, private ones at `private_offset`.
pub fn allocate(policy: &NetworkPolicy, topology: Topology) -> PolicyResult<NetworkPlan> {
    let vpc: Ipv4Net = policy
        .vpc_cidr
        .parse()
        .map_err(|e| PolicyError::SubnetAllocation(format!("{}: {}", policy.vpc_cidr, e)))?;
    let vpc = vpc.trunc();

    let public_subnets = subnets(&vpc, policy, policy.public_offset, topology.public_zones)?;
    let private_subnets = subnets(&vpc, policy, policy.private_offset, topology.private_zones)?;

    Ok(NetworkPlan {
        vpc_cidr: vpc.to_string(),
        public_subnets,
        private_subnets,
        nat_gateway: topology.nat_gateway && topology.private_zones > 0,
    })
}

fn subnets(
    vpc: &Ipv4Net,
    policy: &NetworkPolicy,
    offset: u32,
    count: u8,
) -> PolicyResult<Vec<SubnetPlan>> {
    let mut result = Vec::with_capacity(count as usize);
    for zone in 0..count {
        let index = offset + zone as u32;
        let net = vpc
            .subnets(policy.subnet_prefix)
            .map_err(|e| PolicyError::SubnetAllocation(e.to_string()))?
            .nth(index as usize)
            .ok_or_else(|| {
                PolicyError::SubnetAllocation(format!(
                    "{} has no /{} subnet at index {}",
                    vpc, policy.subnet_prefix, index
                ))
            })?;
        result.push(SubnetPlan {
            cidr: net.to_string(),
            zone_index: zone,
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_allocation() {
        let plan = allocate(
            &NetworkPolicy::default(),
            Topology {
                public_zones: 2,
                private_zones: 2,
                nat_gateway: true,
            },
        )
        .unwrap();

        assert_eq!(plan.vpc_cidr, "10.0.0.0/16");
        let public: Vec<_> = plan.public_subnets.iter().map(|s| s.cidr.as_str()).collect();
        let private: Vec<_> = plan.private_subnets.iter().map(|s| s.cidr.as_str()).collect();
        assert_eq!(public, vec!["10.0.1.0/24", "10.0.2.0/24"]);
        assert_eq!(private, vec!["10.0.101.0/24", "10.0.102.0/24"]);
        assert!(plan.nat_gateway);
    }

    #[test]
    fn test_nat_requires_private_subnets() {
        let plan = allocate(
            &NetworkPolicy::default(),
            Topology {
                public_zones: 1,
                private_zones: 0,
                nat_gateway: true,
            },
        )
        .unwrap();
        assert!(!plan.nat_gateway);
    }

    #[test]
    fn test_out_of_range_index() {
        let policy = NetworkPolicy {
            vpc_cidr: "10.0.0.0/22".to_string(),
            ..NetworkPolicy::default()
        };
        let result = allocate(
            &policy,
            Topology {
                public_zones: 1,
                private_zones: 1,
                nat_gateway: false,
            },
        );
        assert!(matches!(result, Err(PolicyError::SubnetAllocation(_))));
    }
}
