//! Point-of-sale sales, debt payments and member accounts.

use super::notify::{DomainEvent, Notifier};
use super::{adjust_debt, charge_to_account, load_member, resolve_open_shift};
use crate::config::Config;
use crate::db::Repository;
use crate::domain::{
    Member, MemberId, Money, PaymentMethod, Sale, SaleDraft, SaleItem, SaleType, SessionId,
    TimeMs,
};
use crate::error::{CoreError, Policy, Precondition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// A sale as entered at the counter, before pricing and attachment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub method: PaymentMethod,
    #[serde(default)]
    pub sale_type: SaleType,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub member_id: Option<MemberId>,
    pub items: Vec<SaleItem>,
}

impl NewSale {
    /// Sum of the item lines. Empty, zero or negative totals are refused, and
    /// so is a total that does not fit in an amount.
    pub fn amount(&self) -> Result<Money, CoreError> {
        if self.items.is_empty() || self.items.iter().any(|item| item.quantity <= 0) {
            return Err(Precondition::NonPositiveAmount.into());
        }
        let amount = self
            .items
            .iter()
            .try_fold(Money::ZERO, |total, item| {
                item.line_total().and_then(|line| total.checked_add(line))
            })
            .ok_or(Policy::AmountOutOfRange)?;
        if !amount.is_positive() {
            return Err(Precondition::NonPositiveAmount.into());
        }
        Ok(amount)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub sale: Sale,
    pub member: Member,
}

/// A member with their sale history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAccount {
    #[serde(flatten)]
    pub member: Member,
    pub available_credit: Money,
    pub sales: Vec<Sale>,
}

#[derive(Clone)]
pub struct SalesService {
    repo: Arc<Repository>,
    notifier: Arc<dyn Notifier>,
    config: Config,
}

impl SalesService {
    pub fn new(repo: Arc<Repository>, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        Self {
            repo,
            notifier,
            config,
        }
    }

    pub async fn record_sale(&self, new_sale: NewSale) -> Result<Sale, CoreError> {
        self.record_sale_at(new_sale, TimeMs::now()).await
    }

    /// Record a counter sale. ACCOUNT sales add to the member's debt within
    /// the same transaction.
    pub async fn record_sale_at(&self, new_sale: NewSale, now: TimeMs) -> Result<Sale, CoreError> {
        let amount = new_sale.amount()?;
        if new_sale.method == PaymentMethod::Unrecognized {
            return Err(Policy::UnsupportedMethod.into());
        }
        if new_sale.sale_type == SaleType::DebtPayment {
            return Err(Policy::UnsupportedSaleType.into());
        }
        let on_account = new_sale.method.is_on_account();

        let mut tx = self.repo.begin().await?;

        if let Some(session_id) = new_sale.session_id {
            let session = Repository::fetch_session(&mut *tx, session_id)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("session {}", session_id)))?;
            if !session.is_active() {
                return Err(Precondition::SessionClosed.into());
            }
        }

        let member = match (on_account, new_sale.member_id) {
            (true, None) => return Err(Precondition::MemberRequired.into()),
            (_, Some(id)) => Some(load_member(&mut *tx, id).await?),
            (false, None) => None,
        };

        let shift_id = resolve_open_shift(&mut *tx, self.config.shift_policy).await?;

        let charged = match member {
            Some(m) if on_account => Some(charge_to_account(&mut *tx, &m, amount).await?),
            _ => None,
        };

        let sale = Repository::insert_sale(
            &mut *tx,
            &SaleDraft {
                amount,
                method: new_sale.method,
                sale_type: new_sale.sale_type,
                session_id: new_sale.session_id,
                shift_id,
                member_id: new_sale.member_id,
                items: new_sale.items,
                created_at: now,
                is_historical: false,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            amount = %sale.amount,
            method = %sale.method,
            shift_id = ?sale.shift_id,
            "sale recorded"
        );

        if let Some(m) = charged {
            self.notifier
                .notify(DomainEvent::MemberDebtChanged {
                    member_id: m.id,
                    current_debt: m.current_debt,
                })
                .await;
        }

        Ok(sale)
    }

    pub async fn record_debt_payment(
        &self,
        member_id: MemberId,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<PaymentReceipt, CoreError> {
        self.record_debt_payment_at(member_id, amount, method, TimeMs::now())
            .await
    }

    /// Take a payment against a member's debt.
    pub async fn record_debt_payment_at(
        &self,
        member_id: MemberId,
        amount: Money,
        method: PaymentMethod,
        now: TimeMs,
    ) -> Result<PaymentReceipt, CoreError> {
        if !amount.is_positive() {
            return Err(Precondition::NonPositiveAmount.into());
        }
        match method {
            PaymentMethod::Account => return Err(Policy::AccountNotAllowed.into()),
            PaymentMethod::Unrecognized => return Err(Policy::UnsupportedMethod.into()),
            _ => {}
        }

        let mut tx = self.repo.begin().await?;

        let member = load_member(&mut *tx, member_id).await?;
        if amount > member.current_debt {
            return Err(Policy::OverPayment {
                amount,
                current_debt: member.current_debt,
            }
            .into());
        }

        let shift_id = resolve_open_shift(&mut *tx, self.config.shift_policy).await?;
        let member = adjust_debt(&mut *tx, &member, member.current_debt - amount).await?;

        let sale = Repository::insert_sale(
            &mut *tx,
            &SaleDraft {
                amount,
                method,
                sale_type: SaleType::DebtPayment,
                session_id: None,
                shift_id,
                member_id: Some(member_id),
                items: Vec::new(),
                created_at: now,
                is_historical: false,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            %member_id,
            %amount,
            %method,
            remaining = %member.current_debt,
            "debt payment recorded"
        );
        self.notifier
            .notify(DomainEvent::MemberDebtChanged {
                member_id,
                current_debt: member.current_debt,
            })
            .await;

        Ok(PaymentReceipt { sale, member })
    }

    /// Store a backdated sale. It never joins a shift and leaves member debt alone.
    pub async fn import_historical_sale(
        &self,
        new_sale: NewSale,
        created_at: TimeMs,
    ) -> Result<Sale, CoreError> {
        let amount = new_sale.amount()?;

        let mut tx = self.repo.begin().await?;
        if let Some(id) = new_sale.member_id {
            load_member(&mut *tx, id).await?;
        }
        if let Some(id) = new_sale.session_id {
            if Repository::fetch_session(&mut *tx, id).await?.is_none() {
                return Err(CoreError::NotFound(format!("session {}", id)));
            }
        }

        let sale = Repository::insert_sale(
            &mut *tx,
            &SaleDraft {
                amount,
                method: new_sale.method,
                sale_type: new_sale.sale_type,
                session_id: new_sale.session_id,
                shift_id: None,
                member_id: new_sale.member_id,
                items: new_sale.items,
                created_at,
                is_historical: true,
            },
        )
        .await?;
        tx.commit().await?;

        info!(sale_id = %sale.id, amount = %sale.amount, %created_at, "historical sale imported");
        Ok(sale)
    }

    pub async fn create_member(&self, name: &str, debt_limit: Money) -> Result<Member, CoreError> {
        if debt_limit.is_negative() {
            return Err(Precondition::NegativeAmount.into());
        }
        let member = self.repo.insert_member(name, debt_limit).await?;
        info!(member_id = %member.id, %debt_limit, "member created");
        Ok(member)
    }

    pub async fn get_member(&self, member_id: MemberId) -> Result<MemberAccount, CoreError> {
        let member = self
            .repo
            .get_member(member_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("member {}", member_id)))?;
        let sales = self.repo.query_sales_for_member(member_id).await?;
        Ok(MemberAccount {
            available_credit: member.available_credit(),
            member,
            sales,
        })
    }

    pub async fn list_debtors(&self) -> Result<Vec<Member>, CoreError> {
        Ok(self.repo.list_debtors().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShiftPolicy;
    use crate::db::repo::test_support::setup_test_db;
    use crate::orchestration::notify::RecordingNotifier;
    use crate::orchestration::ShiftService;
    use tempfile::TempDir;
    use tokio_test::assert_ok;

    fn test_config(shift_policy: ShiftPolicy) -> Config {
        Config {
            port: 0,
            database_path: ":memory:".to_string(),
            default_rate_per_minute: Money::ZERO,
            shift_policy,
            score_rules: Default::default(),
            bootstrap_admin: "admin".to_string(),
        }
    }

    async fn setup(
        policy: ShiftPolicy,
        open_shift: bool,
    ) -> (Arc<Repository>, SalesService, TempDir) {
        let (repo, temp) = setup_test_db().await;
        let repo = Arc::new(repo);
        let config = test_config(policy);
        if open_shift {
            ShiftService::new(repo.clone())
                .open_shift_at(Money::ZERO, TimeMs::new(0))
                .await
                .unwrap();
        }
        let sales = SalesService::new(repo.clone(), Arc::new(RecordingNotifier::new()), config);
        (repo, sales, temp)
    }

    fn item(name: &str, quantity: i64, unit_price: i64) -> SaleItem {
        SaleItem {
            name: name.to_string(),
            quantity,
            unit_price: Money::from_units(unit_price),
        }
    }

    fn counter_sale(method: PaymentMethod, items: Vec<SaleItem>) -> NewSale {
        NewSale {
            method,
            sale_type: SaleType::Consumption,
            session_id: None,
            member_id: None,
            items,
        }
    }

    #[tokio::test]
    async fn test_sale_amount_from_items() {
        let (_repo, sales, _temp) = setup(ShiftPolicy::Required, true).await;
        let sale = sales
            .record_sale_at(
                counter_sale(
                    PaymentMethod::Cash,
                    vec![item("Cerveza", 2, 2500), item("Papas", 1, 1800)],
                ),
                TimeMs::new(10),
            )
            .await
            .unwrap();
        assert_eq!(sale.amount, Money::from_units(6_800));
        assert!(sale.shift_id.is_some());
        assert_eq!(sale.items.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_sale_rejected() {
        let (_repo, sales, _temp) = setup(ShiftPolicy::Required, true).await;
        let result = sales
            .record_sale_at(counter_sale(PaymentMethod::Cash, vec![]), TimeMs::new(10))
            .await;
        assert!(matches!(
            result,
            Err(CoreError::PreconditionFailed(Precondition::NonPositiveAmount))
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_sale_rejected_without_writing() {
        let (repo, sales, _temp) = setup(ShiftPolicy::Required, true).await;
        let oversized = SaleItem {
            name: "Mesa completa".to_string(),
            quantity: 9_000_000_000_000_000_000,
            unit_price: Money::parse("10000000000000000000000000").unwrap(),
        };
        let result = sales
            .record_sale_at(counter_sale(PaymentMethod::Cash, vec![oversized]), TimeMs::new(10))
            .await;
        assert!(matches!(
            result,
            Err(CoreError::PolicyViolation(Policy::AmountOutOfRange))
        ));

        let shift = repo.get_open_shift().await.unwrap().unwrap();
        assert!(repo.query_sales_for_shift(shift.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_required_policy_without_shift() {
        let (_repo, sales, _temp) = setup(ShiftPolicy::Required, false).await;
        let result = sales
            .record_sale_at(
                counter_sale(PaymentMethod::Cash, vec![item("Agua", 1, 1000)]),
                TimeMs::new(10),
            )
            .await;
        assert!(matches!(
            result,
            Err(CoreError::PreconditionFailed(Precondition::NoOpenShift))
        ));
    }

    #[tokio::test]
    async fn test_optional_policy_records_unattached() {
        let (_repo, sales, _temp) = setup(ShiftPolicy::Optional, false).await;
        let sale = sales
            .record_sale_at(
                counter_sale(PaymentMethod::Cash, vec![item("Agua", 1, 1000)]),
                TimeMs::new(10),
            )
            .await
            .unwrap();
        assert_eq!(sale.shift_id, None);
    }

    #[tokio::test]
    async fn test_account_sale_and_payment_cycle() {
        let (repo, sales, _temp) = setup(ShiftPolicy::Required, true).await;
        let member = sales
            .create_member("Rosa", Money::from_units(10_000))
            .await
            .unwrap();

        let mut sale = counter_sale(PaymentMethod::Account, vec![item("Bebida", 3, 1500)]);
        sale.member_id = Some(member.id);
        assert_ok!(sales.record_sale_at(sale, TimeMs::new(10)).await);
        assert_eq!(
            repo.get_member(member.id).await.unwrap().unwrap().current_debt,
            Money::from_units(4_500)
        );

        let over = sales
            .record_debt_payment_at(
                member.id,
                Money::from_units(5_000),
                PaymentMethod::Cash,
                TimeMs::new(20),
            )
            .await;
        assert!(matches!(
            over,
            Err(CoreError::PolicyViolation(Policy::OverPayment { .. }))
        ));

        let on_account = sales
            .record_debt_payment_at(
                member.id,
                Money::from_units(1_000),
                PaymentMethod::Account,
                TimeMs::new(20),
            )
            .await;
        assert!(matches!(
            on_account,
            Err(CoreError::PolicyViolation(Policy::AccountNotAllowed))
        ));

        let receipt = sales
            .record_debt_payment_at(
                member.id,
                Money::from_units(4_500),
                PaymentMethod::Transfer,
                TimeMs::new(30),
            )
            .await
            .unwrap();
        assert_eq!(receipt.member.current_debt, Money::ZERO);
        assert_eq!(receipt.sale.sale_type, SaleType::DebtPayment);

        let account = sales.get_member(member.id).await.unwrap();
        assert_eq!(account.sales.len(), 2);
        assert_eq!(account.available_credit, Money::from_units(10_000));
        assert!(sales.list_debtors().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_account_sale_over_limit() {
        let (repo, sales, _temp) = setup(ShiftPolicy::Required, true).await;
        let member = sales.create_member("Rosa", Money::from_units(2_000)).await.unwrap();

        let mut sale = counter_sale(PaymentMethod::Account, vec![item("Bebida", 2, 1500)]);
        sale.member_id = Some(member.id);
        let result = sales.record_sale_at(sale, TimeMs::new(10)).await;

        assert!(matches!(
            result,
            Err(CoreError::PolicyViolation(Policy::CreditLimitExceeded { .. }))
        ));
        assert_eq!(
            repo.get_member(member.id).await.unwrap().unwrap().current_debt,
            Money::ZERO
        );
    }

    #[tokio::test]
    async fn test_historical_sale_skips_shift() {
        let (_repo, sales, _temp) = setup(ShiftPolicy::Required, true).await;
        let sale = sales
            .import_historical_sale(
                counter_sale(PaymentMethod::Cash, vec![item("Mesa", 1, 4000)]),
                TimeMs::new(5),
            )
            .await
            .unwrap();
        assert!(sale.is_historical);
        assert_eq!(sale.shift_id, None);
        assert_eq!(sale.created_at, TimeMs::new(5));
    }
}
