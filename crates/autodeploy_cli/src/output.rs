//! Result printing.

use anyhow::Result;
use autodeploy_core::Prepared;
use autodeploy_iac::{DeploymentResult, DeploymentStatus};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_prepared(prepared: &Prepared, verbose: bool) {
    let spec = &prepared.spec;
    let plan = &prepared.plan;

    println!("🔍 Interpreted instruction");
    println!("   Deployment type: {}", spec.deployment_type);
    println!("   Framework:       {}", spec.framework);
    println!("   Environment:     {}", spec.environment);
    println!("   Security level:  {}", spec.security_level);
    println!("   Scaling:         {}", spec.scaling_requirements);
    println!("   Database:        {}", spec.database_required);
    println!("   Region:          {}", spec.region);
    if !prepared.defaulted.is_empty() {
        println!("   Defaulted:       {}", prepared.defaulted.join(", "));
    }

    println!();
    println!("📊 Resource plan: {}", plan.name_prefix);
    println!(
        "   Compute:    {} ({})",
        plan.compute.instance_class,
        plan.compute.family.as_str()
    );
    println!(
        "   Capacity:   {}-{} across {} zone(s)",
        plan.scaling.min_capacity, plan.scaling.max_capacity, plan.scaling.zones
    );
    if let Some(db) = &plan.database {
        println!(
            "   Database:   {} {} (multi-AZ: {})",
            db.engine, db.instance_class, db.multi_az
        );
    }
    println!(
        "   Encryption: at rest {}, in transit {}",
        plan.encryption.at_rest, plan.encryption.in_transit
    );

    if verbose {
        for (name, content) in prepared.artifacts.iter() {
            println!();
            println!("📄 {}", name);
            println!("{}", "-".repeat(40));
            println!("{}", content);
        }
    }
}

pub fn print_result(result: &DeploymentResult, verbose: bool) {
    println!();
    println!("{}", "=".repeat(60));
    println!("🎯 DEPLOYMENT RESULT: {}", result.status.as_str().to_uppercase());
    println!("{}", "=".repeat(60));
    println!("   Working directory: {}", result.working_dir.display());

    if let Some(error) = &result.error {
        println!("❌ {} failed: {}", error.stage, error.message);
        if !error.output.is_empty() {
            println!();
            println!("{}", error.output);
        }
        return;
    }

    match result.status {
        DeploymentStatus::Planned => {
            println!("📋 Deployment planned successfully!");
            println!("   Terraform files: {}", result.artifacts.join(", "));
            if verbose {
                print_output("Terraform Plan Output", result.plan_output.as_deref());
            }
        }
        DeploymentStatus::Applied => {
            println!("✅ Infrastructure deployed successfully!");
            if !result.outputs.is_empty() {
                println!();
                println!("🔗 Deployment Outputs:");
                for (name, value) in &result.outputs {
                    match value.as_str() {
                        Some(text) => println!("   {}: {}", name, text),
                        None => println!("   {}: {}", name, value),
                    }
                }
            }
            if verbose {
                print_output("Terraform Apply Output", result.apply_output.as_deref());
            }
        }
        DeploymentStatus::Destroyed => {
            println!("🗑️  Infrastructure destroyed successfully!");
            if verbose {
                print_output("Terraform Destroy Output", result.destroy_output.as_deref());
            }
        }
        DeploymentStatus::Init | DeploymentStatus::Failed => {}
    }
}

fn print_output(title: &str, output: Option<&str>) {
    if let Some(output) = output {
        println!();
        println!("📄 {}:", title);
        println!("{}", "-".repeat(40));
        println!("{}", output);
    }
}
