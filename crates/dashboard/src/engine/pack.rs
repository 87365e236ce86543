//! Pack resolution.
//!
//! A buyer checkout with several items may be split into several orders that
//! share a pack ID. Each member order reports only its own line items, and
//! the same listing can show up on more than one member. Resolution turns a
//! listing of orders into one [`SaleRecord`] per purchase.

use std::collections::{HashMap, HashSet};

use meli_pulse_core::{ItemId, LineItem, Order, OrderId, PackId, SaleLine, SaleRecord};
use rust_decimal::Decimal;

use super::Diagnostics;
use crate::mercadolibre::MarketplaceApi;

/// Resolves orders into sale records for one aggregation call.
///
/// Owns the set of orders already accounted for, so a pack is reported once
/// no matter how many of its members appear in the listing.
pub struct PackResolver<'a, A> {
    api: &'a A,
    seen_orders: HashSet<OrderId>,
    diagnostics: Diagnostics,
}

impl<'a, A: MarketplaceApi> PackResolver<'a, A> {
    /// Start a resolution scope.
    #[must_use]
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            seen_orders: HashSet::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Resolve one order from a listing.
    ///
    /// `in_hand` holds the orders of the current listing; pack members found
    /// there are not fetched again. Returns `None` when the order was already
    /// included in an earlier record.
    pub async fn resolve(
        &mut self,
        order: &Order,
        in_hand: &HashMap<&OrderId, &Order>,
    ) -> Option<SaleRecord> {
        if self.seen_orders.contains(&order.id) {
            self.diagnostics.skipped_orders += 1;
            return None;
        }

        let Some(pack_id) = order.pack_id.as_ref() else {
            self.seen_orders.insert(order.id.clone());
            return Some(single_order_record(order));
        };

        let pack = match self.api.get_pack(pack_id).await {
            Ok(pack) => pack,
            Err(e) => {
                tracing::warn!(
                    order_id = %order.id,
                    pack_id = %pack_id,
                    error = %e,
                    "Pack fetch failed, counting order alone"
                );
                self.diagnostics.failed_pack_fetches += 1;
                self.seen_orders.insert(order.id.clone());
                return Some(single_order_record(order));
            }
        };

        // The triggering order always leads, whether or not the pack lists it
        self.seen_orders.insert(order.id.clone());
        let mut members = vec![order.clone()];

        for member in &pack.orders {
            if self.seen_orders.contains(&member.id) {
                continue;
            }

            let fetched = match in_hand.get(&member.id) {
                Some(listed) => Ok((*listed).clone()),
                None => self.api.get_order(&member.id).await,
            };

            match fetched {
                Ok(member_order) => {
                    self.seen_orders.insert(member.id.clone());
                    members.push(member_order);
                }
                Err(e) => {
                    tracing::warn!(
                        pack_id = %pack_id,
                        order_id = %member.id,
                        error = %e,
                        "Pack member fetch failed, skipping member"
                    );
                    self.diagnostics.failed_order_fetches += 1;
                }
            }
        }

        Some(pack_record(pack_id, order, &members, &mut self.diagnostics))
    }

    /// Finish the scope, returning its counters.
    #[must_use]
    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}

fn sale_line(line: &LineItem) -> SaleLine {
    SaleLine {
        item_id: line.item.id.clone(),
        title: line.item.title.clone(),
        sku: None,
        seller_sku: line.item.seller_sku.clone(),
        quantity: line.quantity,
        unit_price: line.unit_price,
    }
}

/// Sum the present values, or `None` when none is present.
///
/// An overflowing sum is dropped and counted.
fn sum_present(
    values: impl Iterator<Item = Option<Decimal>>,
    diagnostics: &mut Diagnostics,
) -> Option<Decimal> {
    let mut present = values.flatten().peekable();
    present.peek()?;

    let sum = present.try_fold(Decimal::ZERO, Decimal::checked_add);
    if sum.is_none() {
        diagnostics.overflowed_amounts += 1;
    }
    sum
}

/// A record for an order outside any pack, or one whose pack is unavailable.
fn single_order_record(order: &Order) -> SaleRecord {
    SaleRecord {
        id: order.id.to_string(),
        pack_id: order.pack_id.clone(),
        order_ids: vec![order.id.clone()],
        date_created: order.date_created,
        lines: order.order_items.iter().map(sale_line).collect(),
        payment_amount: order.first_payment().map(|p| p.transaction_amount),
        order_total: order.total_amount,
    }
}

/// Merge pack members into one record, keeping the first line per listing.
fn pack_record(
    pack_id: &PackId,
    trigger: &Order,
    members: &[Order],
    diagnostics: &mut Diagnostics,
) -> SaleRecord {
    let mut seen_items: HashSet<&ItemId> = HashSet::new();
    let mut lines = Vec::new();

    for line in members.iter().flat_map(|m| &m.order_items) {
        if seen_items.insert(&line.item.id) {
            lines.push(sale_line(line));
        } else {
            diagnostics.duplicate_items += 1;
        }
    }

    SaleRecord {
        id: pack_id.to_string(),
        pack_id: Some(pack_id.clone()),
        order_ids: members.iter().map(|m| m.id.clone()).collect(),
        date_created: trigger.date_created,
        lines,
        payment_amount: sum_present(
            members
                .iter()
                .map(|m| m.first_payment().map(|p| p.transaction_amount)),
            diagnostics,
        ),
        order_total: sum_present(members.iter().map(|m| m.total_amount), diagnostics),
    }
}
