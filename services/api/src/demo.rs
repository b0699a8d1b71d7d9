use clap::Args;
use pr_reviewer::assignment::{
    AssignmentEngine, AssignmentSettings, InMemoryReviewStore, NewMember, NewPullRequest, NewTeam,
    PullRequestId, ReviewError, SystemClock, TeamService, UserId,
};
use pr_reviewer::error::AppError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Seed the replacement draw so reassignments repeat between runs.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Skip the second team and its successful reassignment.
    #[arg(long)]
    pub(crate) backend_only: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { seed, backend_only } = args;

    let store = Arc::new(InMemoryReviewStore::new());
    let teams = TeamService::new(Arc::clone(&store));
    let engine = AssignmentEngine::new(
        Arc::clone(&store),
        Arc::new(SystemClock),
        AssignmentSettings::default(),
    );
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    println!("Reviewer assignment demo");

    let backend = teams.create_team(demo_team(
        "backend",
        &[("u1", "Alice", true), ("u2", "Bob", true), ("u3", "Carol", false)],
    ))?;
    print_section("Team created", &backend);

    let pr = engine.create(demo_pull_request("pr-1001", "Add search", "u1"))?;
    print_section("Pull request opened by Alice", &pr);

    match engine.reassign_with(&pr.id, &UserId::from("u2"), &mut rng) {
        Ok(reassignment) => print_section("Bob reassigned", &reassignment),
        Err(ReviewError::NoCandidate) => {
            println!("\nReassigning Bob: no eligible teammate (Carol is inactive)")
        }
        Err(err) => return Err(err.into()),
    }

    if !backend_only {
        let platform = teams.create_team(demo_team(
            "platform",
            &[
                ("u10", "Pat", true),
                ("u11", "Quinn", true),
                ("u12", "Riley", true),
                ("u13", "Sam", true),
            ],
        ))?;
        print_section("Team created", &platform);

        let opened = engine.create(demo_pull_request("pr-2001", "Cache warmup", "u10"))?;
        print_section("Pull request opened by Pat", &opened);
        if let Some(first) = opened.reviewers.first() {
            let reassignment = engine.reassign_with(&opened.id, first, &mut rng)?;
            print_section("First reviewer reassigned", &reassignment);
        }
    }

    let merged = engine.merge(&PullRequestId::from("pr-1001"))?;
    print_section("Pull request merged", &merged);
    let again = engine.merge(&PullRequestId::from("pr-1001"))?;
    println!(
        "\nMerging again keeps the original timestamp: {}",
        again.merged_at == merged.merged_at
    );

    let reviews = engine.reviews_for(&UserId::from("u2"))?;
    print_section("Bob's review queue", &reviews);

    let stats = engine.reviewer_stats()?;
    print_section("Reviewer load", &stats);

    Ok(())
}

fn demo_team(name: &str, members: &[(&str, &str, bool)]) -> NewTeam {
    NewTeam {
        team_name: name.to_string(),
        members: members
            .iter()
            .map(|(id, username, is_active)| NewMember {
                user_id: UserId::from(*id),
                username: (*username).to_string(),
                is_active: *is_active,
            })
            .collect(),
    }
}

fn demo_pull_request(id: &str, name: &str, author: &str) -> NewPullRequest {
    NewPullRequest {
        pull_request_id: PullRequestId::from(id),
        pull_request_name: name.to_string(),
        author_id: UserId::from(author),
    }
}

fn print_section<T: Serialize>(title: &str, value: &T) {
    println!("\n{title}");
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => println!("<unrenderable: {err}>"),
    }
}
