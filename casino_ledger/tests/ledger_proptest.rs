/// Property-based tests for ledger invariants using proptest
///
/// Random sequences of deposits, withdrawals and wager settlements are run
/// against an in-memory ledger; the balance must never go negative and the
/// signed transaction log must always explain the balance.
use casino_ledger::db::Stores;
use casino_ledger::ledger::{Ledger, LedgerConfig, LedgerError, TransactionRecord};
use casino_ledger::wager::{Draw, net_for};
use proptest::prelude::*;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
enum Op {
    Deposit(Decimal),
    Withdraw(Decimal),
    Wager { stake: Decimal, draw: Draw },
}

// Amounts in cents, 0.01 to 500.00
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=50_000).prop_map(|cents| Decimal::new(cents, 2))
}

// Multiplier in [1, 3) at 8-decimal resolution
fn draw_strategy() -> impl Strategy<Value = Draw> {
    prop_oneof![
        Just(Draw::Lose),
        (0i64..200_000_000)
            .prop_map(|steps| Draw::win(Decimal::ONE + Decimal::new(steps, 8)).unwrap()),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        amount_strategy().prop_map(Op::Deposit),
        amount_strategy().prop_map(Op::Withdraw),
        (amount_strategy(), draw_strategy()).prop_map(|(stake, draw)| Op::Wager { stake, draw }),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn test_balance_never_negative_and_log_agrees(
        start in (0i64..=100_000).prop_map(|cents| Decimal::new(cents, 2)),
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let rt = runtime();
        let (final_amount, records, violations) = rt.block_on(async {
            let stores = Stores::in_memory();
            let ledger = Ledger::with_config(stores.accounts, stores.transactions, LedgerConfig::default());
            ledger.open_account(1, start).await.unwrap();

            let mut violations = Vec::new();
            for op in &ops {
                let before = ledger.balance(1).await.unwrap();
                let result = match op {
                    Op::Deposit(amount) => ledger.deposit(1, *amount).await,
                    Op::Withdraw(amount) => ledger.withdraw(1, *amount).await,
                    Op::Wager { stake, draw } => ledger
                        .apply_net(1, *stake, net_for(*stake, *draw))
                        .await
                        .map(|(balance, _)| balance),
                };

                let after = ledger.balance(1).await.unwrap();
                match result {
                    Ok(balance) => {
                        if balance.amount < Decimal::ZERO {
                            violations.push(format!("negative balance after {op:?}"));
                        }
                        if balance.version != before.version + 1 {
                            violations.push(format!("version skipped after {op:?}"));
                        }
                    }
                    Err(LedgerError::InsufficientFunds { .. }) => {
                        if after != before {
                            violations.push(format!("state changed on rejected {op:?}"));
                        }
                    }
                    Err(e) => violations.push(format!("unexpected error {e} for {op:?}")),
                }
            }

            let balance = ledger.balance(1).await.unwrap();
            let records = ledger.transactions(1).await.unwrap();
            (balance.amount, records, violations)
        });

        prop_assert!(violations.is_empty(), "{:?}", violations);
        prop_assert!(final_amount >= Decimal::ZERO);

        let logged: Decimal = records.iter().map(TransactionRecord::signed_amount).sum();
        prop_assert_eq!(logged, final_amount - start);

        for pair in records.windows(2) {
            prop_assert_eq!(pair[1].balance_version, pair[0].balance_version + 1);
        }
    }

    #[test]
    fn test_wager_net_is_loss_or_bounded_profit(
        stake in amount_strategy(),
        draw in draw_strategy(),
    ) {
        let net = net_for(stake, draw);
        match draw {
            Draw::Lose => prop_assert_eq!(net, -stake),
            Draw::Win { multiplier } => {
                let multiplier = multiplier.get();
                prop_assert!(net >= Decimal::ZERO);
                prop_assert!(net <= stake * (multiplier - Decimal::ONE));
                prop_assert!(net < stake * Decimal::TWO);
                prop_assert!(net.scale() <= 8);
            }
        }
    }
}
