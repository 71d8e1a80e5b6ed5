//! The interactive sparring loop.

use anyhow::Result;
use futures_util::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use varena_core::events::StageEvent;
use varena_core::services::TurnEvents;
use varena_core::{GameOutcome, SessionId};

use crate::bootstrap::CliContext;

const HELP_LINE: &str = "输入台词回车发送 | /rescue 求助救场大师 | /report 复盘报告 | /end 结束对决 | /quit 退出";

/// Run one sparring session to completion.
pub async fn run(ctx: &CliContext, scenario: Option<String>) -> Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let scenario_id = match scenario {
        Some(id) => id,
        None => match choose_scenario(ctx, &mut input).await? {
            Some(id) => id,
            None => return Ok(()),
        },
    };

    let opened = ctx.app.create_session(&scenario_id).await?;
    println!();
    println!(
        "=== {} === 对手: {}",
        opened.scenario_name, opened.speaker_name
    );
    for line in &opened.opening {
        println!("{}: {}", line.speaker, line.text);
    }
    println!(
        "气场 你 {} : {} 对方",
        opened.scores.user_dominance, opened.scores.ai_dominance
    );
    println!("{HELP_LINE}");

    let session_id = opened.session_id;
    loop {
        print_prompt();
        let Some(line) = input.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();

        match line.as_str() {
            "/quit" => break,
            "/end" => {
                finish(ctx, &session_id).await?;
                break;
            }
            "/report" => print_report(ctx, &session_id).await?,
            "/rescue" => {
                if rescue(ctx, &session_id, &mut input).await? {
                    finish(ctx, &session_id).await?;
                    break;
                }
            }
            "" => {}
            _ => {
                let events = ctx.app.submit_turn(&session_id, &line)?;
                if drive(events).await {
                    finish(ctx, &session_id).await?;
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Print the scenario catalog.
pub fn list_scenarios(scenarios: &[(String, String)]) {
    println!("可选场景:");
    for (index, (id, name)) in scenarios.iter().enumerate() {
        println!("  {}. {name} ({id})", index + 1);
    }
}

async fn choose_scenario(
    ctx: &CliContext,
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<Option<String>> {
    let scenarios = ctx.app.scenarios();
    list_scenarios(&scenarios);
    print!("选择场景编号> ");
    flush();
    let Some(line) = input.next_line().await? else {
        return Ok(None);
    };
    let choice = line.trim();
    let picked = choice
        .parse::<usize>()
        .ok()
        .and_then(|n| scenarios.get(n.wrapping_sub(1)))
        .map(|(id, _)| id.clone())
        .or_else(|| {
            scenarios
                .iter()
                .find(|(id, _)| id == choice)
                .map(|(id, _)| id.clone())
        });
    if picked.is_none() {
        println!("无效选择: {choice}");
    }
    Ok(picked)
}

/// Render a turn's event stream. Returns whether the game ended.
async fn drive(mut events: TurnEvents) -> bool {
    let mut ended = false;
    while let Some(event) = events.next().await {
        match event {
            StageEvent::UserSent { note, .. } => {
                if let Some(note) = note {
                    println!("⚠ {note}");
                }
            }
            StageEvent::AiThinking { model, .. } => {
                if let Some(model) = model {
                    println!("…{model} 正在思考");
                }
            }
            StageEvent::AiResponded { note, .. } => {
                if let Some(note) = note {
                    println!("✦ {note}");
                }
            }
            StageEvent::Complete {
                scores,
                ai_text,
                audio_path,
                verdict,
                score_delta,
                game_over,
                outcome,
            } => {
                println!("{ai_text}");
                println!(
                    "[点评] {verdict} (气场转移 {score_delta:+}) | 你 {} : {} 对方",
                    scores.user_dominance, scores.ai_dominance
                );
                if let Some(path) = audio_path {
                    println!("[语音] {}", path.display());
                }
                if game_over {
                    match outcome {
                        Some(GameOutcome::UserWin) => println!("🏆 对方的气场被你彻底压制！"),
                        Some(GameOutcome::AiWin) => println!("💢 你的气场被彻底压制……"),
                        None => {}
                    }
                    ended = true;
                }
            }
        }
    }
    ended
}

async fn rescue(
    ctx: &CliContext,
    session_id: &SessionId,
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<bool> {
    let suggestion = match ctx.app.rescue_suggestion(session_id).await {
        Ok(text) => text,
        Err(err) => {
            println!("救场大师暂时联系不上: {err}");
            return Ok(false);
        }
    };
    println!("[救场大师建议] {suggestion}");
    print!("让救场大师替你说出这句话吗？(y/N)> ");
    flush();
    let Some(line) = input.next_line().await? else {
        return Ok(false);
    };
    if !line.trim().eq_ignore_ascii_case("y") {
        return Ok(false);
    }
    let events = ctx.app.process_rescue_turn(session_id, &suggestion)?;
    Ok(drive(events).await)
}

async fn print_report(ctx: &CliContext, session_id: &SessionId) -> Result<()> {
    println!("生成复盘报告中……");
    let report = ctx.app.game_report(session_id).await?;
    println!("== 复盘报告: {} ==", report.scenario_name);
    println!("称号: {}", report.medal);
    println!(
        "五维评分: 圆滑 {} | 亲和 {} | 逻辑 {} | 幽默 {} | 规矩 {}",
        report.scores.oily,
        report.scores.friendliness,
        report.scores.logic,
        report.scores.humor,
        report.scores.respect
    );
    println!("总评: {}", report.narrative);
    for voice in &report.npc_inner_voices {
        let avatar = voice.avatar.as_deref().unwrap_or("👤");
        println!("{avatar} {} 内心OS: {}", voice.name, voice.os);
    }
    println!("改进建议: {}", report.suggestion);
    Ok(())
}

async fn finish(ctx: &CliContext, session_id: &SessionId) -> Result<()> {
    let summary = ctx.app.end_session(session_id).await?;
    println!();
    println!("== 对决结束: {} ==", summary.scenario_name);
    println!("{}", summary.result);
    println!(
        "回合数 {} | 最终气场 你 {} : {} 对方",
        summary.turn_count, summary.user_dominance, summary.ai_dominance
    );
    println!();
    println!("{}", summary.narrative);
    println!();
    println!("完整记录已保存: {}", summary.archive_key);
    Ok(())
}

fn print_prompt() {
    print!("你> ");
    flush();
}

fn flush() {
    use std::io::Write;
    let _ = std::io::stdout().flush();
}
