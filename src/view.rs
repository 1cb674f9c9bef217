// src/view.rs
//! Server-side rendering of the dashboard page.

use std::fmt::Write as _;

use crate::config::Deployment;
use crate::dashboard::{Connection, DashboardSnapshot};
use crate::tx::{TxPopupState, TxStatus};

const STYLE: &str = r#"
*{box-sizing:border-box;margin:0;padding:0}
body{font-family:ui-monospace,Menlo,Consolas,monospace;font-size:14px;background:#1d232a;color:#a6adbb;display:flex;justify-content:center;min-height:100vh}
.page{flex:1;max-width:48rem;background:#2a323c;display:flex;flex-direction:column}
.hero{background:#661ae6;color:#fff;padding:1rem}
.hero h1{font-size:1.875rem;font-weight:700}
.panel{padding:1rem}
.panel.muted{background:#191e24}
.grid{display:grid;grid-template-columns:1fr 1fr}
.grid .wide{grid-column:1/-1}
.stack>*{margin-bottom:.5rem}
.truncate{overflow:hidden;text-overflow:ellipsis;white-space:nowrap}
input{width:100%;padding:.5rem;background:#1d232a;color:inherit;border:1px solid #3d4451;border-radius:.5rem}
button{width:100%;padding:.5rem;background:transparent;color:inherit;border:1px solid #a6adbb;border-radius:.5rem;cursor:pointer}
button:disabled{opacity:.4;cursor:not-allowed}
.modal{position:fixed;inset:0;background:rgba(0,0,0,.6);display:flex;align-items:center;justify-content:center}
.modal-box{background:#2a323c;padding:1.5rem;border-radius:1rem;max-width:32rem;width:90%}
.modal-box pre{white-space:pre-wrap;word-break:break-all;margin:.5rem 0}
@media(max-width:768px){.grid{grid-template-columns:1fr}}
"#;

const SCRIPT: &str = r#"
async function post(path, body) {
  const res = await fetch(path, {
    method: 'POST',
    headers: {'content-type': 'application/json'},
    body: body === undefined ? undefined : JSON.stringify(body),
  });
  return res.ok ? res.json() : null;
}
async function quote(kind, amount) {
  const input = await post('/api/' + kind + '/amount', {amount});
  const el = document.getElementById(kind + '-preview');
  if (input && el && document.getElementById(kind + '-amount').value === input.amount) {
    el.textContent = input.preview;
  }
}
async function act(path) {
  await post(path);
  location.reload();
}
if (document.querySelector('[data-pending]') || document.querySelector('[data-busy]')) {
  setTimeout(() => location.reload(), 3000);
}
"#;

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_page(snapshot: &DashboardSnapshot, deployment: &Deployment) -> String {
    let token = escape_html(&deployment.token_symbol);
    let mut body = String::new();

    let _ = write!(
        body,
        r#"<div class="hero"><h1>Elastic Money {token}</h1><p>Collateral-backed elastic supply token.</p></div>"#
    );
    body.push_str(r#"<div class="grid">"#);
    let _ = write!(body, r#"<div class="wide">{}</div>"#, connection_panel(snapshot, deployment));
    if snapshot.connection == Connection::Connected {
        let _ = write!(body, r#"<div class="wide">{}</div>"#, info_panel(snapshot, deployment));
        let _ = write!(body, "<div>{}</div>", mint_panel(snapshot, deployment));
        let _ = write!(body, "<div>{}</div>", burn_panel(snapshot, deployment));
    }
    body.push_str("</div>");

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>Elastic Money {token}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <div class=\"page\">{body}</div>\n{popup}\n<script>{SCRIPT}</script>\n</body>\n</html>\n",
        popup = popup_panel(&snapshot.popup),
    )
}

pub fn connection_panel(snapshot: &DashboardSnapshot, deployment: &Deployment) -> String {
    match snapshot.connection {
        Connection::Busy => r#"<div class="panel muted" data-busy>loading...</div>"#.to_string(),
        Connection::Error => format!(
            r#"<div class="panel muted">ensure the wallet key is configured,<br>set the RPC network to {},<br>and reconnect<br><button onclick="act('/api/reconnect')">Reconnect</button></div>"#,
            escape_html(&deployment.chain_name)
        ),
        Connection::Connected => {
            let user = &snapshot.user_data;
            format!(
                r#"<div class="panel muted">Connected to: {chain}<br>{coin}: {user_coin}<br>{token}: {user_token}<p class="truncate">{address}</p></div>"#,
                chain = escape_html(&snapshot.chain_name),
                coin = escape_html(&deployment.coin_symbol),
                token = escape_html(&deployment.token_symbol),
                user_coin = escape_html(&user.user_coin),
                user_token = escape_html(&user.user_token),
                address = escape_html(&user.user_address),
            )
        }
    }
}

fn info_panel(snapshot: &DashboardSnapshot, deployment: &Deployment) -> String {
    let chain = &snapshot.chain_data;
    let coin = escape_html(&deployment.coin_symbol);
    let token = escape_html(&deployment.token_symbol);
    let reference = chain.coingecko_price.as_deref().map(escape_html).unwrap_or_else(|| "n/a".to_string());
    let disabled = if chain.rebase { "" } else { " disabled" };
    format!(
        r#"<div class="panel stack"><div>{token} total supply: {supply}<br>algobank collateral: {balance} {coin}<br>algobank collateral in $: {balance_usd} $<br>{coin} algobank price: {price} $<br>{coin} coingecko price: {reference} $<br></div><div><button onclick="act('/api/rebase')"{disabled}>Rebase</button></div></div>"#,
        supply = escape_html(&chain.token_total_supply),
        balance = escape_html(&chain.bank_coin_balance),
        balance_usd = escape_html(&chain.bank_coin_balance_usd),
        price = escape_html(&chain.bank_coin_price),
    )
}

fn mint_panel(snapshot: &DashboardSnapshot, deployment: &Deployment) -> String {
    let coin = escape_html(&deployment.coin_symbol);
    let token = escape_html(&deployment.token_symbol);
    format!(
        r#"<div class="panel stack"><div>For {worth} {coin} (worth ~1$) mint 1 {token}</div><div><input id="mint-amount" type="text" placeholder="Amount {coin}" value="{amount}" oninput="quote('mint', this.value)"></div><div>receive <span id="mint-preview">{preview}</span> {token}</div><div><button onclick="act('/api/mint')">Mint</button></div></div>"#,
        worth = snapshot.coin_worth,
        amount = escape_html(&snapshot.mint.amount),
        preview = escape_html(&snapshot.mint.preview),
    )
}

fn burn_panel(snapshot: &DashboardSnapshot, deployment: &Deployment) -> String {
    let coin = escape_html(&deployment.coin_symbol);
    let token = escape_html(&deployment.token_symbol);
    format!(
        r#"<div class="panel stack"><div>Burn 1 {token} for {worth} {coin} (worth ~1$)</div><div><input id="burn-amount" type="text" placeholder="Amount {token}" value="{amount}" oninput="quote('burn', this.value)"></div><div>receive <span id="burn-preview">{preview}</span> {coin}</div><div><button onclick="act('/api/burn')">Burn</button></div></div>"#,
        worth = snapshot.coin_worth,
        amount = escape_html(&snapshot.burn.amount),
        preview = escape_html(&snapshot.burn.preview),
    )
}

pub fn popup_panel(popup: &TxPopupState) -> String {
    if !popup.visible {
        return String::new();
    }
    let hash = popup
        .tx_hash
        .as_deref()
        .map(|hash| format!("<pre>tx: {}</pre>", escape_html(hash)))
        .unwrap_or_default();
    let (title, marker, detail) = match popup.status {
        TxStatus::Pending => ("Transaction pending...", " data-pending", String::new()),
        TxStatus::Success => ("Transaction confirmed", "", String::new()),
        TxStatus::Error => (
            "Transaction failed",
            "",
            format!("<pre>{}</pre>", escape_html(popup.error_message.as_deref().unwrap_or_default())),
        ),
        TxStatus::Idle => ("", "", String::new()),
    };
    let close = if popup.is_pending() {
        String::new()
    } else {
        r#"<button onclick="act('/api/popup/dismiss')">Close</button>"#.to_string()
    };
    format!(r#"<div class="modal"{marker}><div class="modal-box"><h3>{title}</h3>{hash}{detail}{close}</div></div>"#)
}
